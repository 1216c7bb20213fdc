//! IOCA image objects.
//!
//! ```text
//! BIM  BOG OBD OBP IDD EOG  IPD* EIM
//! ```
//!
//! The image content is split across as many IPD records as needed. The first
//! one opens the image segment and carries the size and encoding parameters,
//! the last one closes it.

use super::field::{Category, SfType, StructuredField};
use super::records::{UNITS_PER_TEN_INCHES, u24};
use super::triplet::Triplet;
use crate::fonts::ebcdic_name;
use crate::model::{Compression, Rotation};
use crate::raster::ImageRecord;

/// Largest slice of image data carried by one image data parameter.
pub const MAX_IMAGE_CHUNK: usize = 8192;

const BEGIN_SEGMENT: u8 = 0x70;
const END_SEGMENT: u8 = 0x71;
const BEGIN_IMAGE_CONTENT: u8 = 0x91;
const END_IMAGE_CONTENT: u8 = 0x93;
const IMAGE_SIZE: u8 = 0x94;
const IMAGE_ENCODING: u8 = 0x95;
const IDE_SIZE: u8 = 0x96;
const IDE_STRUCTURE: u8 = 0x9B;
/// Extended parameter prefix for image data, which needs a 2-byte length.
const IMAGE_DATA: [u8; 2] = [0xFE, 0x92];

fn compression_id(compression: Option<Compression>) -> u8 {
    match compression {
        None => 0x03,
        Some(Compression::CcittG3) => 0x81,
        Some(Compression::CcittG4) => 0x82,
        Some(Compression::Jpeg) => 0x83,
    }
}

/// Object area position relative to the page, oriented like the active frame.
fn position_params(x: i32, y: i32, rotation: Rotation) -> Vec<u8> {
    let mut params = vec![0x01, 0x17];
    params.extend_from_slice(&u24(x));
    params.extend_from_slice(&u24(y));
    params.extend_from_slice(&rotation.orientation().to_be_bytes());
    params.extend_from_slice(&(rotation + Rotation::Deg90).orientation().to_be_bytes());
    params.push(0x00);
    // content origin at the area origin, unrotated
    params.extend_from_slice(&[0x00; 6]);
    params.extend_from_slice(&Rotation::Deg0.orientation().to_be_bytes());
    params.extend_from_slice(&Rotation::Deg90.orientation().to_be_bytes());
    params.push(0x01);
    params
}

fn descriptor_params(record: &ImageRecord) -> Vec<u8> {
    let mut params = vec![0x00];
    params.extend_from_slice(&record.resolution.0.to_be_bytes());
    params.extend_from_slice(&record.resolution.1.to_be_bytes());
    params.extend_from_slice(&record.size.0.to_be_bytes());
    params.extend_from_slice(&record.size.1.to_be_bytes());
    // IOCA function set: FS10 for bilevel, FS11 otherwise
    let function_set = if record.bits_per_pixel == 1 && !record.is_pre_encoded() {
        0x0A
    } else {
        0x0B
    };
    params.extend_from_slice(&[0xF7, 0x02, 0x01, function_set]);
    params
}

fn segment_header(record: &ImageRecord) -> Vec<u8> {
    let mut out = vec![BEGIN_SEGMENT, 0x00, BEGIN_IMAGE_CONTENT, 0x01, 0xFF];
    out.extend_from_slice(&[IMAGE_SIZE, 0x09, 0x00]);
    out.extend_from_slice(&record.resolution.0.to_be_bytes());
    out.extend_from_slice(&record.resolution.1.to_be_bytes());
    out.extend_from_slice(&record.size.0.to_be_bytes());
    out.extend_from_slice(&record.size.1.to_be_bytes());
    out.extend_from_slice(&[IMAGE_ENCODING, 0x02, compression_id(record.compression), 0x01]);
    out.extend_from_slice(&[IDE_SIZE, 0x01, record.bits_per_pixel]);
    if record.bits_per_pixel == 24 {
        // RGB, 8 bits per component
        out.extend_from_slice(&[IDE_STRUCTURE, 0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 8, 8, 8]);
    }
    out
}

/// Structured fields for one image object placed at the record's viewport.
pub(crate) fn image_object(name: &str, record: &ImageRecord, rotation: Rotation) -> Vec<StructuredField> {
    let name8 = ebcdic_name(name).to_vec();
    let area = &record.viewport;
    let mut fields = vec![
        StructuredField::new(SfType::Begin, Category::Image).with_params(name8.clone()),
        StructuredField::new(SfType::Begin, Category::ObjectEnvironmentGroup)
            .with_params(name8.clone()),
        StructuredField::new(SfType::Descriptor, Category::ObjectArea)
            .with_triplet(Triplet::DescriptorPosition { id: 0x01 })
            .with_triplet(Triplet::MeasurementUnits {
                x_units: UNITS_PER_TEN_INCHES,
                y_units: UNITS_PER_TEN_INCHES,
            })
            .with_triplet(Triplet::ObjectAreaSize {
                width: u32::try_from(area.width).unwrap_or(0),
                height: u32::try_from(area.height).unwrap_or(0),
            }),
        StructuredField::new(SfType::Position, Category::ObjectArea)
            .with_params(position_params(area.x, area.y, rotation)),
        StructuredField::new(SfType::Descriptor, Category::Image)
            .with_params(descriptor_params(record)),
        StructuredField::new(SfType::End, Category::ObjectEnvironmentGroup)
            .with_params(name8.clone()),
        StructuredField::new(SfType::Data, Category::Image).with_params(segment_header(record)),
    ];

    for chunk in record.data.chunks(MAX_IMAGE_CHUNK) {
        let mut params = Vec::with_capacity(chunk.len() + 4);
        params.extend_from_slice(&IMAGE_DATA);
        params.extend_from_slice(&(chunk.len() as u16).to_be_bytes());
        params.extend_from_slice(chunk);
        fields.push(StructuredField::new(SfType::Data, Category::Image).with_params(params));
    }

    fields.push(
        StructuredField::new(SfType::Data, Category::Image)
            .with_params(vec![END_IMAGE_CONTENT, 0x00, END_SEGMENT, 0x00]),
    );
    fields.push(StructuredField::new(SfType::End, Category::Image).with_params(name8));
    fields
}
