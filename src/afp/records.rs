//! Constructors for the structured fields the renderer emits.

use super::field::{Category, SfType, StructuredField};
use super::ptoca::ControlChain;
use super::triplet::{FqnType, ObjectClass, Triplet};
use crate::fonts::ebcdic_name;
use crate::model::{DataObject, ResourceLocation, Rotation};

/// Measurement base: units per ten inches at 240 dpi.
pub const UNITS_PER_TEN_INCHES: u16 = 2400;

pub(crate) fn u24(v: i32) -> [u8; 3] {
    let b = (v.clamp(-0x80_0000, 0x7F_FFFF)).to_be_bytes();
    [b[1], b[2], b[3]]
}

fn named(sf_type: SfType, category: Category, name: &str) -> StructuredField {
    StructuredField::new(sf_type, category).with_params(ebcdic_name(name).to_vec())
}

pub fn begin_document(name: &str) -> StructuredField {
    let mut params = ebcdic_name(name).to_vec();
    params.extend_from_slice(&[0x00, 0x00]);
    StructuredField::new(SfType::Begin, Category::Document).with_params(params)
}

pub fn end_document(name: &str) -> StructuredField {
    named(SfType::End, Category::Document, name)
}

pub fn begin_page(name: &str) -> StructuredField {
    named(SfType::Begin, Category::Page, name)
}

pub fn end_page(name: &str) -> StructuredField {
    named(SfType::End, Category::Page, name)
}

pub fn begin_active_environment_group(name: &str) -> StructuredField {
    named(SfType::Begin, Category::ActiveEnvironmentGroup, name)
}

pub fn end_active_environment_group(name: &str) -> StructuredField {
    named(SfType::End, Category::ActiveEnvironmentGroup, name)
}

/// Page size in device units.
pub fn page_descriptor(width: i32, height: i32) -> StructuredField {
    let mut params = vec![0x00, 0x00];
    params.extend_from_slice(&UNITS_PER_TEN_INCHES.to_be_bytes());
    params.extend_from_slice(&UNITS_PER_TEN_INCHES.to_be_bytes());
    params.extend_from_slice(&u24(width));
    params.extend_from_slice(&u24(height));
    params.extend_from_slice(&[0x00, 0x00, 0x00]);
    StructuredField::new(SfType::Descriptor, Category::Page).with_params(params)
}

pub fn presentation_text_descriptor(width: i32, height: i32) -> StructuredField {
    let mut params = vec![0x00, 0x00];
    params.extend_from_slice(&UNITS_PER_TEN_INCHES.to_be_bytes());
    params.extend_from_slice(&UNITS_PER_TEN_INCHES.to_be_bytes());
    params.extend_from_slice(&u24(width));
    params.extend_from_slice(&u24(height));
    params.extend_from_slice(&[0x00, 0x00]);
    StructuredField::new(SfType::Migration, Category::PresentationText).with_params(params)
}

pub fn begin_presentation_text(name: &str) -> StructuredField {
    named(SfType::Begin, Category::PresentationText, name)
}

pub fn end_presentation_text(name: &str) -> StructuredField {
    named(SfType::End, Category::PresentationText, name)
}

/// A filled rule from `(x1, y1)` to `(x2, y2)` in device units. Returns `None`
/// for diagonal rules, which presentation text cannot draw.
pub fn line_data(
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    thickness: i32,
    rotation: Rotation,
    color: [u8; 3],
) -> Option<StructuredField> {
    let mut chain = ControlChain::new();
    chain
        .set_text_orientation(rotation)
        .absolute_move_baseline(y1)
        .absolute_move_inline(x1)
        .set_extended_text_color(color);
    if y1 == y2 {
        chain.draw_i_axis_rule(x2 - x1, thickness);
    } else if x1 == x2 {
        chain.draw_b_axis_rule(y2 - y1, thickness);
    } else {
        return None;
    }
    Some(StructuredField::new(SfType::Data, Category::PresentationText).with_params(chain.finish()))
}

/// Positioned text in an already encoded code page.
pub struct TextPlacement<'a> {
    pub font_reference: u8,
    pub x: i32,
    pub y: i32,
    pub rotation: Rotation,
    pub color: [u8; 3],
    pub variable_space_increment: i32,
    pub intercharacter_adjustment: i32,
    pub data: &'a [u8],
}

pub fn text_data(text: &TextPlacement<'_>) -> StructuredField {
    let mut chain = ControlChain::new();
    chain
        .set_text_orientation(text.rotation)
        .absolute_move_baseline(text.y)
        .absolute_move_inline(text.x)
        .set_coded_font_local(text.font_reference)
        .set_extended_text_color(text.color)
        .set_variable_space_increment(text.variable_space_increment)
        .set_intercharacter_adjustment(text.intercharacter_adjustment)
        .transparent_data(text.data);
    StructuredField::new(SfType::Data, Category::PresentationText).with_params(chain.finish())
}

/// Further text for the run placed by the preceding [`text_data`] record.
pub fn text_continuation(data: &[u8]) -> StructuredField {
    let mut chain = ControlChain::new();
    chain.transparent_data(data);
    StructuredField::new(SfType::Data, Category::PresentationText).with_params(chain.finish())
}

/// Font map entry binding a local font reference to a character set and code page.
pub fn map_coded_font(
    reference: u8,
    character_set: &str,
    code_page: &str,
    size: i32,
) -> StructuredField {
    // millipoints to 1/1440 inch
    let vertical_size = (size as f64 / 50.0).round().clamp(0.0, u16::MAX as f64) as u16;
    StructuredField::new(SfType::Map, Category::CodedFont)
        .with_repeating_group()
        .with_triplet(Triplet::FullyQualifiedName {
            fqn_type: FqnType::CodePageNameRef,
            name: code_page.to_string(),
        })
        .with_triplet(Triplet::FullyQualifiedName {
            fqn_type: FqnType::FontCharacterSetNameRef,
            name: character_set.to_string(),
        })
        .with_triplet(Triplet::ResourceLocalId {
            resource_type: 0x05,
            id: reference,
        })
        .with_triplet(Triplet::FontDescriptor { vertical_size })
}

pub fn include_page_segment(name: &str, x: i32, y: i32) -> StructuredField {
    let mut params = ebcdic_name(name).to_vec();
    params.extend_from_slice(&u24(x));
    params.extend_from_slice(&u24(y));
    StructuredField::new(SfType::Include, Category::PageSegment).with_params(params)
}

pub fn include_page_overlay(name: &str, x: i32, y: i32, rotation: Rotation) -> StructuredField {
    let mut params = ebcdic_name(name).to_vec();
    params.extend_from_slice(&u24(x));
    params.extend_from_slice(&u24(y));
    params.extend_from_slice(&rotation.orientation().to_be_bytes());
    StructuredField::new(SfType::Include, Category::PageOverlay).with_params(params)
}

/// Data resource map: names the object either by external file path or by the
/// fully qualified name of an embedded resource, plus its classification.
pub fn map_data_resource(object: &DataObject) -> StructuredField {
    let fqn = match &object.location {
        ResourceLocation::External { path } => Triplet::FullyQualifiedName {
            fqn_type: FqnType::DataObjectExternalResourceRef,
            name: path.clone(),
        },
        ResourceLocation::Embedded {
            fully_qualified_name,
        } => Triplet::FullyQualifiedName {
            fqn_type: FqnType::BeginResourceObjectRef,
            name: fully_qualified_name.clone(),
        },
    };
    StructuredField::new(SfType::Map, Category::DataResource)
        .with_repeating_group()
        .with_triplet(fqn)
        .with_triplet(Triplet::ObjectClassification {
            class: ObjectClass::TimeVariantPresentation,
            object_type: object.object_type,
        })
}

/// Places a mapped data object; position and size in device units.
pub fn include_object(
    name: &str,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    rotation: Rotation,
) -> StructuredField {
    let mut params = ebcdic_name(name).to_vec();
    params.push(0x00);
    params.push(0x92); // other object data
    params.extend_from_slice(&u24(x));
    params.extend_from_slice(&u24(y));
    params.extend_from_slice(&rotation.orientation().to_be_bytes());
    params.extend_from_slice(&(rotation + Rotation::Deg90).orientation().to_be_bytes());
    params.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    params.push(0x01); // page coordinate system
    StructuredField::new(SfType::Include, Category::DataResource)
        .with_params(params)
        .with_triplet(Triplet::MeasurementUnits {
            x_units: UNITS_PER_TEN_INCHES,
            y_units: UNITS_PER_TEN_INCHES,
        })
        .with_triplet(Triplet::ObjectAreaSize {
            width: u32::try_from(width).unwrap_or(0),
            height: u32::try_from(height).unwrap_or(0),
        })
}

pub fn tag_logical_element(name: &str, value: &str) -> StructuredField {
    StructuredField::new(SfType::Attribute, Category::ProcessElement)
        .with_triplet(Triplet::FullyQualifiedName {
            fqn_type: FqnType::AttributeGid,
            name: name.to_string(),
        })
        .with_triplet(Triplet::AttributeValue {
            value: value.to_string(),
        })
}

pub fn no_operation(content: &str) -> StructuredField {
    StructuredField::new(SfType::Data, Category::NoOperation)
        .with_params(crate::fonts::to_ebcdic_bytes(content))
}
