//! Presentation text control sequences.
//!
//! A chain opens with the escape `2B D3`; each sequence is `length | type | params`
//! and carries the odd (chained) function type when another sequence follows.

use crate::model::Rotation;

const ESCAPE: [u8; 2] = [0x2B, 0xD3];
/// Longest transparent data run a single sequence can carry.
pub const MAX_TRANSPARENT_DATA: usize = 253;

// Unchained function types.
const SEC: u8 = 0x80;
const SIA: u8 = 0xC2;
const SVI: u8 = 0xC4;
const AMI: u8 = 0xC6;
const AMB: u8 = 0xD2;
const TRN: u8 = 0xDA;
const DIR: u8 = 0xE4;
const DBR: u8 = 0xE6;
const SCFL: u8 = 0xF0;
const STO: u8 = 0xF6;

#[derive(Default)]
pub(crate) struct ControlChain {
    sequences: Vec<(u8, Vec<u8>)>,
}

fn coord(v: i32) -> [u8; 2] {
    (v.clamp(i16::MIN as i32, i16::MAX as i32) as i16).to_be_bytes()
}

impl ControlChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, function: u8, params: Vec<u8>) -> &mut Self {
        self.sequences.push((function, params));
        self
    }

    pub(crate) fn set_text_orientation(&mut self, rotation: Rotation) -> &mut Self {
        let baseline = rotation + Rotation::Deg90;
        let mut params = rotation.orientation().to_be_bytes().to_vec();
        params.extend_from_slice(&baseline.orientation().to_be_bytes());
        self.push(STO, params)
    }

    pub(crate) fn absolute_move_baseline(&mut self, y: i32) -> &mut Self {
        self.push(AMB, coord(y).to_vec())
    }

    pub(crate) fn absolute_move_inline(&mut self, x: i32) -> &mut Self {
        self.push(AMI, coord(x).to_vec())
    }

    pub(crate) fn set_coded_font_local(&mut self, font_reference: u8) -> &mut Self {
        self.push(SCFL, vec![font_reference])
    }

    pub(crate) fn set_extended_text_color(&mut self, color: [u8; 3]) -> &mut Self {
        let [r, g, b] = color;
        // reserved, RGB color space, 4 reserved, component bit sizes, value
        self.push(
            SEC,
            vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 8, 8, 8, 0, r, g, b],
        )
    }

    pub(crate) fn set_variable_space_increment(&mut self, increment: i32) -> &mut Self {
        self.push(SVI, coord(increment).to_vec())
    }

    pub(crate) fn set_intercharacter_adjustment(&mut self, adjustment: i32) -> &mut Self {
        let direction = if adjustment < 0 { 0x01 } else { 0x00 };
        let mut params = coord(adjustment.abs()).to_vec();
        params.push(direction);
        self.push(SIA, params)
    }

    pub(crate) fn transparent_data(&mut self, data: &[u8]) -> &mut Self {
        for chunk in data.chunks(MAX_TRANSPARENT_DATA) {
            self.push(TRN, chunk.to_vec());
        }
        self
    }

    pub(crate) fn draw_i_axis_rule(&mut self, length: i32, thickness: i32) -> &mut Self {
        let mut params = coord(length).to_vec();
        params.extend_from_slice(&coord(thickness));
        params.push(0x00);
        self.push(DIR, params)
    }

    pub(crate) fn draw_b_axis_rule(&mut self, length: i32, thickness: i32) -> &mut Self {
        let mut params = coord(length).to_vec();
        params.extend_from_slice(&coord(thickness));
        params.push(0x00);
        self.push(DBR, params)
    }

    pub(crate) fn finish(&self) -> Vec<u8> {
        let mut out = ESCAPE.to_vec();
        let last = self.sequences.len().saturating_sub(1);
        for (i, (function, params)) in self.sequences.iter().enumerate() {
            let chained = if i == last { *function } else { function | 0x01 };
            out.push((params.len() + 2) as u8);
            out.push(chained);
            out.extend_from_slice(params);
        }
        out
    }
}
