#![allow(dead_code)]

use std::sync::Arc;

use afp_render::fonts::{CodePage, FontHandle, FontService, StandardFonts};
use afp_render::model::PageViewport;
use afp_render::{Error, Renderer, RendererOptions};

pub const BDT: (u8, u8) = (0xA8, 0xA8);
pub const EDT: (u8, u8) = (0xA9, 0xA8);
pub const BPG: (u8, u8) = (0xA8, 0xAF);
pub const EPG: (u8, u8) = (0xA9, 0xAF);
pub const PGD: (u8, u8) = (0xA6, 0xAF);
pub const BPT: (u8, u8) = (0xA8, 0x9B);
pub const EPT: (u8, u8) = (0xA9, 0x9B);
pub const PTX: (u8, u8) = (0xEE, 0x9B);
pub const MCF: (u8, u8) = (0xAB, 0x8A);
pub const BIM: (u8, u8) = (0xA8, 0xFB);
pub const IPD: (u8, u8) = (0xEE, 0xFB);
pub const IPS: (u8, u8) = (0xAF, 0x5F);
pub const IPO: (u8, u8) = (0xAF, 0xD8);
pub const IOB: (u8, u8) = (0xAF, 0xC3);
pub const MDR: (u8, u8) = (0xAB, 0xC3);
pub const TLE: (u8, u8) = (0xA0, 0x90);
pub const NOP: (u8, u8) = (0xEE, 0xEE);

/// One structured field read back from an output stream.
#[derive(Debug, Clone)]
pub struct Field {
    pub id: (u8, u8),
    /// Value of the length field.
    pub length: usize,
    /// Everything after the 9-byte introducer.
    pub data: Vec<u8>,
}

/// Splits a stream into fields, checking every introducer on the way.
pub fn split_fields(bytes: &[u8]) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        assert_eq!(bytes[pos], 0x5A, "carriage control at offset {pos}");
        let length = u16::from_be_bytes([bytes[pos + 1], bytes[pos + 2]]) as usize;
        assert_eq!(bytes[pos + 3], 0xD3, "class byte at offset {pos}");
        let end = pos + 1 + length;
        assert!(end <= bytes.len(), "field at {pos} runs past the stream end");
        fields.push(Field {
            id: (bytes[pos + 4], bytes[pos + 5]),
            length,
            data: bytes[pos + 9..end].to_vec(),
        });
        pos = end;
    }
    fields
}

pub fn count(fields: &[Field], id: (u8, u8)) -> usize {
    fields.iter().filter(|f| f.id == id).count()
}

pub fn ids(fields: &[Field]) -> Vec<(u8, u8)> {
    fields.iter().map(|f| f.id).collect()
}

/// Splits a presentation text chain into `(function type, params)` pairs.
pub fn control_sequences(ptx: &[u8]) -> Vec<(u8, Vec<u8>)> {
    assert_eq!(&ptx[..2], &[0x2B, 0xD3], "control sequence escape");
    let mut out = Vec::new();
    let mut pos = 2;
    while pos < ptx.len() {
        let len = ptx[pos] as usize;
        out.push((ptx[pos + 1], ptx[pos + 2..pos + len].to_vec()));
        pos += len;
    }
    out
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn letter() -> PageViewport {
    PageViewport::new(612_000, 792_000)
}

pub fn renderer(options: RendererOptions) -> Renderer<Vec<u8>> {
    Renderer::new(Vec::new(), options, Arc::new(StandardFonts::default())).expect("open document")
}

/// Standard fonts whose encoding lookup always fails.
pub struct NoEncodingFonts(pub StandardFonts);

impl FontService for NoEncodingFonts {
    fn lookup(&self, font_key: &str, size: i32) -> Option<FontHandle> {
        self.0.lookup(font_key, size)
    }

    fn char_width(&self, font: &FontHandle, ch: char, size: i32) -> i32 {
        self.0.char_width(font, ch, size)
    }

    fn encoding(&self, _font: &FontHandle, _size: i32) -> Result<CodePage, Error> {
        Err(Error::FontResolution("no code page installed".to_string()))
    }
}
