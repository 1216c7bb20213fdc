//! Raster preparation for image objects: RGB bitmaps are reduced to packed
//! grayscale (or kept as 24-bit color), precompressed data passes through.

use crate::config::RendererOptions;
use crate::error::Error;
use crate::model::{Bitmap, Compression, ImageData, Rect};

/// Luminance weights scaled by 10^6. Working in integers keeps the result of
/// `0.212671 R + 0.715160 G + 0.072169 B` exact, so white is exactly 255.
const WEIGHT_R: u32 = 212_671;
const WEIGHT_G: u32 = 715_160;
const WEIGHT_B: u32 = 72_169;
const SCALE: u32 = 1_000_000;

/// Luminance of an RGB triple in millionths (0..=255_000_000).
fn luma_millionths(r: u8, g: u8, b: u8) -> u32 {
    WEIGHT_R * r as u32 + WEIGHT_G * g as u32 + WEIGHT_B * b as u32
}

/// Reduces packed 24-bit RGB to grayscale at 1, 4 or 8 bits per pixel.
///
/// Rows are padded to whole bytes. At 1 bpp a set bit (MSB first) marks a dark
/// pixel (luminance below 128); at 4 bpp the high nibble holds the even pixel;
/// at 8 bpp the luminance is truncated to a byte.
pub fn encode_grayscale(
    rgb: &[u8],
    width: u32,
    height: u32,
    bits_per_pixel: u8,
) -> Result<Vec<u8>, Error> {
    if !matches!(bits_per_pixel, 1 | 4 | 8) {
        return Err(Error::UnsupportedBitDepth(bits_per_pixel));
    }
    let (w, h) = (width as usize, height as usize);
    let needed = rgb_len(width, height)?;
    if rgb.len() < needed {
        return Err(Error::InvalidGeometry(format!(
            "bitmap buffer holds {} bytes, {w}x{h} RGB needs {needed}",
            rgb.len()
        )));
    }

    let pixels_per_byte = 8 / bits_per_pixel as usize;
    let row_bytes = w.div_ceil(pixels_per_byte);
    let mut out = vec![0u8; row_bytes * h];
    if w == 0 {
        return Ok(out);
    }

    for (y, row) in rgb.chunks_exact(w * 3).take(h).enumerate() {
        let dest = &mut out[y * row_bytes..(y + 1) * row_bytes];
        for (x, px) in row.chunks_exact(3).enumerate() {
            let luma = luma_millionths(px[0], px[1], px[2]);
            match bits_per_pixel {
                1 => {
                    if luma < 128 * SCALE {
                        dest[x / 8] |= 1 << (7 - (x % 8));
                    }
                }
                4 => {
                    let nibble = (luma / (16 * SCALE)) as u8;
                    dest[x / 2] |= nibble << ((1 - (x % 2)) * 4);
                }
                _ => dest[x] = (luma / SCALE) as u8,
            }
        }
    }
    Ok(out)
}

/// Byte length of a packed RGB buffer of the given dimensions.
fn rgb_len(width: u32, height: u32) -> Result<usize, Error> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| {
            Error::InvalidGeometry(format!("{width}x{height} bitmap does not fit in memory"))
        })
}

/// Image dimensions as written in the descriptor's 2-byte fields.
fn image_size(width: u32, height: u32) -> Result<(u16, u16), Error> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(Error::EncodingOverflow {
            what: "image size",
            size: width.max(height) as usize,
            max: u16::MAX as usize,
        }),
    }
}

/// Image content ready to be written as an image object.
#[derive(Clone, Debug)]
pub struct ImageRecord {
    /// Object area in device units (position relative to the page).
    pub viewport: Rect,
    /// Pixels per ten inches.
    pub resolution: (u16, u16),
    /// Width and height in pixels.
    pub size: (u16, u16),
    pub bits_per_pixel: u8,
    pub data: Vec<u8>,
    /// Set when `data` is already compressed and must be passed through.
    pub compression: Option<Compression>,
}

impl ImageRecord {
    pub fn is_pre_encoded(&self) -> bool {
        self.compression.is_some()
    }

    /// Prepares decoded image data for output under the configured options.
    pub fn from_image_data(
        data: &ImageData,
        viewport: Rect,
        options: &RendererOptions,
    ) -> Result<Self, Error> {
        match data {
            ImageData::Bitmap(bitmap) => Self::from_bitmap(bitmap, viewport, options),
            ImageData::Compressed {
                data,
                compression,
                bits_per_pixel,
                width,
                height,
                dpi_x,
                dpi_y,
            } => Ok(Self {
                viewport,
                resolution: (per_ten_inches(*dpi_x)?, per_ten_inches(*dpi_y)?),
                size: image_size(*width, *height)?,
                bits_per_pixel: *bits_per_pixel,
                data: data.clone(),
                compression: Some(*compression),
            }),
            ImageData::Unsupported { mime } => Err(Error::UnsupportedImageFormat(format!(
                "{mime} images are not supported by this renderer"
            ))),
        }
    }

    fn from_bitmap(bitmap: &Bitmap, viewport: Rect, options: &RendererOptions) -> Result<Self, Error> {
        let size = image_size(bitmap.width, bitmap.height)?;
        let resolution = (per_ten_inches(bitmap.dpi_x)?, per_ten_inches(bitmap.dpi_y)?);
        let (bits_per_pixel, data) = if options.color_images() {
            let len = rgb_len(bitmap.width, bitmap.height)?;
            if bitmap.pixels.len() < len {
                return Err(Error::InvalidGeometry(format!(
                    "bitmap buffer holds {} bytes, expected {len}",
                    bitmap.pixels.len()
                )));
            }
            (24, bitmap.pixels[..len].to_vec())
        } else {
            let bpp = options.bits_per_pixel();
            (
                bpp,
                encode_grayscale(&bitmap.pixels, bitmap.width, bitmap.height, bpp)?,
            )
        };
        Ok(Self {
            viewport,
            resolution,
            size,
            bits_per_pixel,
            data,
            compression: None,
        })
    }
}

fn per_ten_inches(dpi: f64) -> Result<u16, Error> {
    let value = dpi * 10.0;
    if value > u16::MAX as f64 {
        return Err(Error::EncodingOverflow {
            what: "image resolution",
            size: value as usize,
            max: u16::MAX as usize,
        });
    }
    Ok(value.max(0.0) as u16)
}
