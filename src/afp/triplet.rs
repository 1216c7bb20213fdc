use crate::error::Error;
use crate::fonts::to_ebcdic_bytes;

/// Bytes a triplet spends on its length, type and format fields.
pub const TRIPLET_HEADER_LEN: usize = 4;
pub const MAX_TRIPLET_PAYLOAD: usize = 0xFFFF - TRIPLET_HEADER_LEN;

const FORMAT_CHARSTR: u8 = 0x00;

/// What a fully qualified name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FqnType {
    AttributeGid = 0x0B,
    BeginResourceObjectRef = 0x84,
    CodePageNameRef = 0x85,
    FontCharacterSetNameRef = 0x86,
    DataObjectExternalResourceRef = 0xBE,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectClass {
    TimeVariantPresentation = 0x01,
    TimeInvariantPaginated = 0x10,
}

/// Registered object types an object classification can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Goca,
    IocaFs10,
    IocaFs11,
    IocaFs45,
    Eps,
    Tiff,
    Jfif,
    PdfSinglePage,
}

impl ObjectType {
    fn component_id(self) -> u8 {
        match self {
            ObjectType::Goca => 0x03,
            ObjectType::IocaFs10 => 0x05,
            ObjectType::IocaFs11 => 0x0B,
            ObjectType::IocaFs45 => 0x0C,
            ObjectType::Eps => 0x0D,
            ObjectType::Tiff => 0x0E,
            ObjectType::Jfif => 0x17,
            ObjectType::PdfSinglePage => 0x19,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectType::Goca => "GOCA",
            ObjectType::IocaFs10 => "IOCA FS10",
            ObjectType::IocaFs11 => "IOCA FS11",
            ObjectType::IocaFs45 => "IOCA FS45",
            ObjectType::Eps => "EPS",
            ObjectType::Tiff => "TIFF",
            ObjectType::Jfif => "JFIF",
            ObjectType::PdfSinglePage => "PDF Single-page Object",
        }
    }

    /// ASN.1 encoded registered object identifier, zero padded to 16 bytes.
    fn object_id(self) -> [u8; 16] {
        let mut oid = [0u8; 16];
        oid[..9].copy_from_slice(&[0x06, 0x07, 0x2B, 0x12, 0x00, 0x04, 0x01, 0x01, self.component_id()]);
        oid
    }
}

/// Typed attribute nested inside a structured field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Triplet {
    FullyQualifiedName { fqn_type: FqnType, name: String },
    ObjectClassification { class: ObjectClass, object_type: ObjectType },
    ResourceLocalId { resource_type: u8, id: u8 },
    /// Vertical font size in 1/1440 inch.
    FontDescriptor { vertical_size: u16 },
    /// Units per ten inches along each axis.
    MeasurementUnits { x_units: u16, y_units: u16 },
    ObjectAreaSize { width: u32, height: u32 },
    DescriptorPosition { id: u8 },
    AttributeValue { value: String },
    Raw { id: u8, format: u8, payload: Vec<u8> },
}

impl Triplet {
    pub fn id(&self) -> u8 {
        match self {
            Triplet::FullyQualifiedName { .. } => 0x02,
            Triplet::ObjectClassification { .. } => 0x10,
            Triplet::FontDescriptor { .. } => 0x1F,
            Triplet::ResourceLocalId { .. } => 0x24,
            Triplet::AttributeValue { .. } => 0x36,
            Triplet::DescriptorPosition { .. } => 0x43,
            Triplet::MeasurementUnits { .. } => 0x4B,
            Triplet::ObjectAreaSize { .. } => 0x4C,
            Triplet::Raw { id, .. } => *id,
        }
    }

    pub fn format(&self) -> u8 {
        match self {
            Triplet::ObjectClassification { class, .. } => *class as u8,
            Triplet::ResourceLocalId { resource_type, .. } => *resource_type,
            Triplet::Raw { format, .. } => *format,
            _ => FORMAT_CHARSTR,
        }
    }

    pub fn payload(&self) -> Vec<u8> {
        match self {
            Triplet::FullyQualifiedName { fqn_type, name } => {
                let mut p = vec![*fqn_type as u8];
                p.extend(to_ebcdic_bytes(name));
                p
            }
            Triplet::ObjectClassification { object_type, .. } => {
                let mut p = vec![0x00, 0x00];
                p.extend_from_slice(&object_type.object_id());
                let mut type_name = [0x40u8; 32];
                for (slot, b) in type_name.iter_mut().zip(to_ebcdic_bytes(object_type.name())) {
                    *slot = b;
                }
                p.extend_from_slice(&type_name);
                p
            }
            Triplet::ResourceLocalId { id, .. } => vec![*id],
            Triplet::FontDescriptor { vertical_size } => vertical_size.to_be_bytes().to_vec(),
            Triplet::MeasurementUnits { x_units, y_units } => {
                let mut p = vec![0x00, 0x00];
                p.extend_from_slice(&x_units.to_be_bytes());
                p.extend_from_slice(&y_units.to_be_bytes());
                p
            }
            Triplet::ObjectAreaSize { width, height } => {
                let mut p = vec![0x02];
                p.extend_from_slice(&width.to_be_bytes()[1..]);
                p.extend_from_slice(&height.to_be_bytes()[1..]);
                p
            }
            Triplet::DescriptorPosition { id } => vec![*id],
            Triplet::AttributeValue { value } => to_ebcdic_bytes(value),
            Triplet::Raw { payload, .. } => payload.clone(),
        }
    }

    /// Wire form: `length:u16be | type | format | payload`.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let payload = self.payload();
        if payload.len() > MAX_TRIPLET_PAYLOAD {
            return Err(Error::EncodingOverflow {
                what: "triplet",
                size: payload.len() + TRIPLET_HEADER_LEN,
                max: 0xFFFF,
            });
        }
        let len = (payload.len() + TRIPLET_HEADER_LEN) as u16;
        let mut out = Vec::with_capacity(len as usize);
        out.extend_from_slice(&len.to_be_bytes());
        out.push(self.id());
        out.push(self.format());
        out.extend(payload);
        Ok(out)
    }
}
