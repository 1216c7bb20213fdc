pub mod afp;
pub mod border;
pub mod config;
mod error;
pub mod fonts;
pub mod model;
pub mod raster;
pub mod transform;

pub use afp::{DeferredPage, Page, PageState, Renderer};
pub use config::RendererOptions;
pub use error::Error;
pub use fonts::{CodePage, FontHandle, FontService, StandardFonts};
pub use model::{Rotation, mpt_to_units};
pub use transform::{Ctm, TransformStack, ViewportFrame};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use model::{Bitmap, ImageArea, ImageData, PageViewport, Rect};

/// Page size in millipoints for `pixels` at `dpi`.
fn pixels_to_mpt(pixels: u32, dpi: f64) -> i32 {
    (pixels as f64 / dpi * 72_000.0).round() as i32
}

/// Renders each input image onto its own page, sized to the image at `dpi`.
pub fn convert_images_to_afp(
    inputs: &[PathBuf],
    output: &Path,
    options: RendererOptions,
    dpi: f64,
) -> Result<(), Error> {
    if !(dpi > 0.0) {
        return Err(Error::InvalidConfiguration(format!(
            "resolution must be positive (got {dpi})"
        )));
    }
    let t0 = Instant::now();

    let mut bitmaps = Vec::with_capacity(inputs.len());
    for input in inputs {
        let img = image::open(input)?.to_rgb8();
        bitmaps.push((input, Bitmap::from_rgb_image(&img, dpi)));
    }
    let t_decode = t0.elapsed();

    let mut renderer = Renderer::new(Vec::new(), options, Arc::new(StandardFonts::default()))?;
    for (input, bitmap) in bitmaps {
        let width = pixels_to_mpt(bitmap.width, dpi);
        let height = pixels_to_mpt(bitmap.height, dpi);
        let area = ImageArea {
            uri: input.display().to_string(),
            position: Rect::new(0, 0, width, height),
            data: ImageData::Bitmap(bitmap),
        };
        renderer.render_page(&PageViewport::new(width, height), None, |page| {
            page.draw_image(&area)
        })?;
    }
    let bytes = renderer.end_document()?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: decode={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_decode.as_secs_f64() * 1000.0,
        (t_render - t_decode).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
