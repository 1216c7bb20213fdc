//! Structured field framing.
//!
//! ```text
//! 0x5A | length:u16be | 0xD3 type category | flags | sequence:u16be | params [| rg_length:u16be] | triplets
//! ```
//!
//! `length` covers itself and everything after it. Repeating-group records
//! (font maps, data resource maps) carry a second length in front of their
//! triplets that covers itself and the triplet bytes.

use super::triplet::Triplet;
use crate::error::Error;

pub const CARRIAGE_CONTROL: u8 = 0x5A;
pub const SF_CLASS: u8 = 0xD3;
/// Bytes from the carriage control up to the first parameter byte.
pub const INTRODUCER_LEN: usize = 9;
pub const MAX_FIELD_LENGTH: usize = 0xFFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SfType {
    Attribute = 0xA0,
    Descriptor = 0xA6,
    Begin = 0xA8,
    End = 0xA9,
    Map = 0xAB,
    Position = 0xAC,
    Include = 0xAF,
    Migration = 0xB1,
    Data = 0xEE,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Category {
    PageSegment = 0x5F,
    ObjectArea = 0x6B,
    CodedFont = 0x8A,
    ProcessElement = 0x90,
    PresentationText = 0x9B,
    Document = 0xA8,
    Page = 0xAF,
    DataResource = 0xC3,
    ObjectEnvironmentGroup = 0xC7,
    ActiveEnvironmentGroup = 0xC9,
    PageOverlay = 0xD8,
    NoOperation = 0xEE,
    Image = 0xFB,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredField {
    sf_type: SfType,
    category: Category,
    params: Vec<u8>,
    triplets: Vec<Triplet>,
    repeating_group: bool,
}

impl StructuredField {
    pub fn new(sf_type: SfType, category: Category) -> Self {
        Self {
            sf_type,
            category,
            params: Vec::new(),
            triplets: Vec::new(),
            repeating_group: false,
        }
    }

    pub fn with_params(mut self, params: impl Into<Vec<u8>>) -> Self {
        self.params = params.into();
        self
    }

    pub fn with_triplet(mut self, triplet: Triplet) -> Self {
        self.triplets.push(triplet);
        self
    }

    /// Prefixes the triplets with their own repeating-group length.
    pub fn with_repeating_group(mut self) -> Self {
        self.repeating_group = true;
        self
    }

    pub fn sf_type(&self) -> SfType {
        self.sf_type
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn triplets(&self) -> &[Triplet] {
        &self.triplets
    }

    fn encode_triplets(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        for triplet in &self.triplets {
            out.extend(triplet.encode()?);
        }
        Ok(out)
    }

    /// Appends the wire form to `out`. Nothing is written on error.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        let triplet_data = self.encode_triplets()?;
        let rg_len = if self.repeating_group { 2 } else { 0 };
        let length = INTRODUCER_LEN - 1 + self.params.len() + rg_len + triplet_data.len();
        if length > MAX_FIELD_LENGTH {
            return Err(Error::EncodingOverflow {
                what: "structured field",
                size: length,
                max: MAX_FIELD_LENGTH,
            });
        }

        out.reserve(length + 1);
        out.push(CARRIAGE_CONTROL);
        out.extend_from_slice(&(length as u16).to_be_bytes());
        out.extend_from_slice(&[SF_CLASS, self.sf_type as u8, self.category as u8]);
        out.extend_from_slice(&[0x00, 0x00, 0x00]);
        out.extend_from_slice(&self.params);
        if self.repeating_group {
            out.extend_from_slice(&((2 + triplet_data.len()) as u16).to_be_bytes());
        }
        out.extend(triplet_data);
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}
