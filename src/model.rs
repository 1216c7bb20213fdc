//! Positioned area-tree content handed to the renderer by the layout engine.
//!
//! All lengths are millipoints (1/1000 pt) relative to the current viewport
//! unless noted otherwise.

use crate::error::Error;

pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];

/// One of the four orientations AFP can express.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Result<Self, Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(Error::InvalidConfiguration(format!(
                "rotation must be one of 0, 90, 180, 270 (got {other})"
            ))),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Quarter turns clockwise, 0..=3.
    fn quarter_turns(self) -> u32 {
        self.degrees() / 90
    }

    fn from_quarter_turns(turns: u32) -> Self {
        match turns % 4 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    /// Orientation field value: half-degrees in the high byte
    /// (0x0000, 0x2D00, 0x5A00, 0x8700).
    pub(crate) fn orientation(self) -> u16 {
        match self {
            Rotation::Deg0 => 0x0000,
            Rotation::Deg90 => 0x2D00,
            Rotation::Deg180 => 0x5A00,
            Rotation::Deg270 => 0x8700,
        }
    }
}

impl std::ops::Add for Rotation {
    type Output = Rotation;

    fn add(self, rhs: Rotation) -> Rotation {
        Rotation::from_quarter_turns(self.quarter_turns() + rhs.quarter_turns())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BorderStyle {
    Solid,
    Double,
    Dashed,
    Dotted,
    Groove,
    Ridge,
    Hidden,
    Inset,
    Outset,
}

/// A styled rule in millipoints. `start` must be the top-left corner and `end`
/// the bottom-right corner of the rule's bounding box; the cross-axis extent is
/// the rule thickness.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderLine {
    pub style: BorderStyle,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub horizontal: bool,
    pub color: [u8; 3],
}

#[derive(Clone, Debug)]
pub struct TextRun {
    /// Font key understood by the font service (e.g. "sans-serif").
    pub font_key: String,
    /// Font size in millipoints.
    pub font_size: i32,
    pub x: i32,
    /// Baseline position.
    pub y: i32,
    pub color: [u8; 3],
    pub text: String,
    pub word_space_adjust: i32,
    pub letter_space_adjust: i32,
}

/// Decoded raster data: packed 8-bit RGB triples, row-major, no row padding.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub dpi_x: f64,
    pub dpi_y: f64,
}

impl Bitmap {
    pub fn from_rgb_image(img: &image::RgbImage, dpi: f64) -> Self {
        Self {
            pixels: img.as_raw().clone(),
            width: img.width(),
            height: img.height(),
            dpi_x: dpi,
            dpi_y: dpi,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    CcittG3,
    CcittG4,
    Jpeg,
}

#[derive(Clone, Debug)]
pub enum ImageData {
    Bitmap(Bitmap),
    /// Already compressed in a format the printer decodes natively.
    Compressed {
        data: Vec<u8>,
        compression: Compression,
        bits_per_pixel: u8,
        width: u32,
        height: u32,
        dpi_x: f64,
        dpi_y: f64,
    },
    /// Vector or document formats (EPS, SVG, ...) that cannot be rasterized here.
    Unsupported { mime: String },
}

#[derive(Clone, Debug)]
pub struct ImageArea {
    pub uri: String,
    pub position: Rect,
    pub data: ImageData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceLocation {
    External { path: String },
    Embedded { fully_qualified_name: String },
}

/// A data object placed by reference rather than by inline data.
#[derive(Clone, Debug)]
pub struct DataObject {
    pub name: String,
    pub location: ResourceLocation,
    pub object_type: crate::afp::ObjectType,
    pub position: Rect,
}

/// Page-level extension attachments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageSetup {
    IncludePageOverlay { name: String },
    /// Images whose URI equals `source` are replaced by an include of `name`.
    IncludePageSegment { name: String, source: String },
    TagLogicalElement { name: String, value: String },
    NoOperation { content: String },
}

#[derive(Clone, Debug, Default)]
pub struct PageViewport {
    /// Width in millipoints.
    pub width: i32,
    /// Height in millipoints.
    pub height: i32,
    pub setup: Vec<PageSetup>,
}

impl PageViewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            setup: Vec::new(),
        }
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// Millipoints to 1/240 inch device units, rounding half up.
pub fn mpt_to_units(mpt: f64) -> i32 {
    (mpt / 300.0 + 0.5).floor() as i32
}
