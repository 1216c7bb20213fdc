use std::path::PathBuf;
use std::process::ExitCode;

use afp_render::RendererOptions;
use clap::Parser;

/// Convert raster images to an AFP document, one page per image.
#[derive(Parser, Debug)]
#[command(name = "afp-render", version, about)]
struct Args {
    /// Input images (PNG or JPEG)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output AFP file
    #[arg(short, long, default_value = "out.afp")]
    output: PathBuf,

    /// Keep images in 24-bit color instead of grayscale
    #[arg(long)]
    color: bool,

    /// Grayscale depth: 1, 4 or 8
    #[arg(long, default_value_t = 8)]
    bits_per_pixel: u32,

    /// Rotation for portrait pages: 0, 90, 180 or 270
    #[arg(long, default_value_t = 0)]
    portrait_rotation: u32,

    /// Rotation for landscape pages: 0, 90, 180 or 270
    #[arg(long, default_value_t = 270)]
    landscape_rotation: u32,

    /// Resolution the input pixels are placed at
    #[arg(long, default_value_t = 240.0)]
    dpi: f64,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let options = RendererOptions::default()
        .with_color_images(args.color)
        .with_bits_per_pixel(args.bits_per_pixel)
        .with_portrait_rotation(args.portrait_rotation)
        .and_then(|o| o.with_landscape_rotation(args.landscape_rotation));
    let options = match options {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match afp_render::convert_images_to_afp(&args.inputs, &args.output, options, args.dpi) {
        Ok(()) => {
            println!(
                "Converted {} image(s) -> {}",
                args.inputs.len(),
                args.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
