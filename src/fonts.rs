use crate::error::Error;

/// Code pages the renderer can encode text into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodePage {
    /// EBCDIC international (Cp500), the default for AFP fonts.
    Ebcdic500,
    /// Windows-1252.
    WinAnsi,
}

impl CodePage {
    pub const DEFAULT: CodePage = CodePage::Ebcdic500;

    pub fn name(self) -> &'static str {
        match self {
            CodePage::Ebcdic500 => "Cp500",
            CodePage::WinAnsi => "Cp1252",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "cp500" | "ibm500" | "ebcdic-500" => Some(CodePage::Ebcdic500),
            "cp1252" | "windows-1252" | "winansi" => Some(CodePage::WinAnsi),
            _ => None,
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            CodePage::Ebcdic500 => to_ebcdic_bytes(text),
            CodePage::WinAnsi => text.chars().map(char_to_winansi).collect(),
        }
    }
}

/// Opaque font reference returned by a [`FontService`]. The renderer only reads
/// the resource names it must write into the font map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontHandle {
    pub id: usize,
    pub character_set: String,
    pub code_page: String,
}

/// Font metric and encoding lookups supplied by the embedding application.
pub trait FontService: Send + Sync {
    fn lookup(&self, font_key: &str, size: i32) -> Option<FontHandle>;

    /// Advance width of `ch` in millipoints at `size` millipoints.
    fn char_width(&self, font: &FontHandle, ch: char, size: i32) -> i32;

    fn encoding(&self, font: &FontHandle, size: i32) -> Result<CodePage, Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Metrics {
    Helvetica,
    Courier,
}

#[derive(Clone, Debug)]
struct StandardFont {
    family: String,
    character_set: String,
    code_page: String,
    encoding: CodePage,
    metrics: Metrics,
}

/// Resident outline fonts present on every AFP printer, keyed by generic family.
#[derive(Clone, Debug)]
pub struct StandardFonts {
    fonts: Vec<StandardFont>,
    helvetica_widths: Vec<f32>,
}

impl Default for StandardFonts {
    fn default() -> Self {
        let resident = [
            ("sans-serif", "CZH200  ", Metrics::Helvetica),
            ("serif", "CZN200  ", Metrics::Helvetica),
            ("monospace", "CZ4200  ", Metrics::Courier),
        ];
        Self {
            fonts: resident
                .into_iter()
                .map(|(family, character_set, metrics)| StandardFont {
                    family: family.to_string(),
                    character_set: character_set.to_string(),
                    code_page: "T1V10500".to_string(),
                    encoding: CodePage::Ebcdic500,
                    metrics,
                })
                .collect(),
            helvetica_widths: helvetica_widths(),
        }
    }
}

impl StandardFonts {
    /// Registers an additional family backed by Helvetica metrics.
    pub fn with_family(
        mut self,
        family: &str,
        character_set: &str,
        code_page: &str,
        encoding: CodePage,
    ) -> Self {
        self.fonts.push(StandardFont {
            family: family.to_lowercase(),
            character_set: character_set.to_string(),
            code_page: code_page.to_string(),
            encoding,
            metrics: Metrics::Helvetica,
        });
        self
    }

    fn find(&self, key: &str) -> Option<usize> {
        let key = primary_font_name(key).to_lowercase();
        let key = if key == "any" { "sans-serif".to_string() } else { key };
        self.fonts.iter().position(|f| f.family == key)
    }
}

impl FontService for StandardFonts {
    fn lookup(&self, font_key: &str, _size: i32) -> Option<FontHandle> {
        let id = self.find(font_key)?;
        let font = &self.fonts[id];
        Some(FontHandle {
            id,
            character_set: font.character_set.clone(),
            code_page: font.code_page.clone(),
        })
    }

    fn char_width(&self, font: &FontHandle, ch: char, size: i32) -> i32 {
        let w1000 = match self.fonts.get(font.id).map(|f| f.metrics) {
            Some(Metrics::Courier) => 600.0,
            _ => {
                let byte = char_to_winansi(ch);
                if byte >= 32 {
                    self.helvetica_widths[(byte - 32) as usize]
                } else {
                    0.0
                }
            }
        };
        (w1000 * size as f32 / 1000.0).round() as i32
    }

    fn encoding(&self, font: &FontHandle, _size: i32) -> Result<CodePage, Error> {
        self.fonts
            .get(font.id)
            .map(|f| f.encoding)
            .ok_or_else(|| Error::FontResolution(format!("no font with id {}", font.id)))
    }
}

pub(crate) fn primary_font_name(name: &str) -> &str {
    name.split(',').next().unwrap_or(name).trim()
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                          // space
            33..=47 => 333.0,                     // punctuation
            48..=57 => 556.0,                     // digits
            58..=64 => 333.0,                     // more punctuation
            73 | 74 => 278.0,                     // I J (narrow uppercase)
            77 => 833.0,                          // M (wide)
            65..=90 => 667.0,                     // uppercase A-Z (average)
            91..=96 => 333.0,                     // brackets etc.
            102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
            109 | 119 => 833.0,                   // m w (wide)
            97..=122 => 556.0,                    // lowercase a-z (average)
            _ => 556.0,
        })
        .collect()
}

/// Map a single Unicode char to its WinAnsi byte, or '?' if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95, // bullet
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => b'?',
    }
}

/// Map a Unicode char to EBCDIC code page 500. Unmappable chars become '?' (0x6F).
fn char_to_ebcdic(c: char) -> u8 {
    match c {
        ' ' => 0x40,
        '[' => 0x4A,
        '.' => 0x4B,
        '<' => 0x4C,
        '(' => 0x4D,
        '+' => 0x4E,
        '!' => 0x4F,
        '&' => 0x50,
        ']' => 0x5A,
        '$' => 0x5B,
        '*' => 0x5C,
        ')' => 0x5D,
        ';' => 0x5E,
        '^' => 0x5F,
        '-' => 0x60,
        '/' => 0x61,
        ',' => 0x6B,
        '%' => 0x6C,
        '_' => 0x6D,
        '>' => 0x6E,
        '?' => 0x6F,
        '`' => 0x79,
        ':' => 0x7A,
        '#' => 0x7B,
        '@' => 0x7C,
        '\'' => 0x7D,
        '=' => 0x7E,
        '"' => 0x7F,
        'a'..='i' => 0x81 + (c as u8 - b'a'),
        'j'..='r' => 0x91 + (c as u8 - b'j'),
        '~' => 0xA1,
        's'..='z' => 0xA2 + (c as u8 - b's'),
        '|' => 0xBB,
        '{' => 0xC0,
        'A'..='I' => 0xC1 + (c as u8 - b'A'),
        '}' => 0xD0,
        'J'..='R' => 0xD1 + (c as u8 - b'J'),
        '\\' => 0xE0,
        'S'..='Z' => 0xE2 + (c as u8 - b'S'),
        '0'..='9' => 0xF0 + (c as u8 - b'0'),
        _ => 0x6F,
    }
}

pub(crate) fn to_ebcdic_bytes(s: &str) -> Vec<u8> {
    s.chars().map(char_to_ebcdic).collect()
}

/// Fixed 8-byte EBCDIC resource name, truncated or padded with spaces.
pub(crate) fn ebcdic_name(name: &str) -> [u8; 8] {
    let mut out = [0x40u8; 8];
    for (slot, ch) in out.iter_mut().zip(name.chars()) {
        *slot = char_to_ebcdic(ch);
    }
    out
}
