//! `aesir` CLI - image utilities for machine-learning datasets.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::{DynamicImage, Rgb};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aesir_utils::detection::{draw_bboxes, load_font, BoundingBox, BoxFormat, BoxLabels};
use aesir_utils::diffusion::{DEFAULT_BETA, DEFAULT_MAX_STEPS};
use aesir_utils::image::{crop_square_dir, load_image, save_image, DEFAULT_CROP_SIZE};
use aesir_utils::{DenseImage, NoiseConfig};

/// Image utilities for machine-learning datasets.
#[derive(Parser, Debug)]
#[command(name = "aesir")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add forward-diffusion noise to an image.
    Noise {
        /// Input image path.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output image path.
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Diffusion step to simulate (0 leaves the image untouched).
        #[arg(short, long, value_name = "INT", allow_negative_numbers = true)]
        step: i64,

        /// Per-step noise rate (0.0-1.0, exclusive).
        #[arg(long, default_value_t = DEFAULT_BETA, value_name = "FLOAT")]
        beta: f64,

        /// Largest valid step.
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS, value_name = "INT")]
        max_steps: u32,

        /// Random seed for reproducibility.
        #[arg(long, value_name = "INT")]
        seed: Option<u64>,

        /// Output JPEG quality (1-100).
        #[arg(short, long, default_value = "95", value_name = "INT")]
        quality: u8,
    },

    /// Crop every image in a directory to a square and resize it, in place.
    Crop {
        /// Directory holding the images.
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Edge length of the output squares.
        #[arg(short, long, default_value_t = DEFAULT_CROP_SIZE, value_name = "INT")]
        size: u32,
    },

    /// Draw bounding boxes on an image.
    Bbox {
        /// Input image path.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output image path.
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Box coordinates; repeat for several boxes.
        #[arg(
            long = "box",
            value_name = "X0,Y0,X1,Y1",
            value_parser = parse_box,
            required = true,
            allow_negative_numbers = true
        )]
        boxes: Vec<[f32; 4]>,

        /// Read coordinates as x, y, width, height.
        #[arg(long)]
        xywh: bool,

        /// Label for the box in the same position; repeat per box.
        #[arg(long = "label", value_name = "TEXT", requires = "font")]
        labels: Vec<String>,

        /// TrueType or OpenType font used for labels.
        #[arg(long, value_name = "PATH")]
        font: Option<PathBuf>,

        /// Outline colour; repeat to build a palette cycled across boxes.
        #[arg(long = "color", value_name = "R,G,B", value_parser = parse_color)]
        colors: Vec<Rgb<u8>>,

        /// Output JPEG quality (1-100).
        #[arg(short, long, default_value = "95", value_name = "INT")]
        quality: u8,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("aesir_utils={log_level},aesir={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args.command) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(command: &Command) -> Result<()> {
    match command {
        Command::Noise {
            input,
            output,
            step,
            beta,
            max_steps,
            seed,
            quality,
        } => {
            let config = NoiseConfig {
                beta: *beta,
                max_steps: *max_steps,
                seed: *seed,
                output_quality: *quality,
            };
            noise(input, output, *step, &config)
        }
        Command::Crop { dir, size } => crop(dir, *size),
        Command::Bbox {
            input,
            output,
            boxes,
            xywh,
            labels,
            font,
            colors,
            quality,
        } => {
            let format = if *xywh {
                BoxFormat::Xywh
            } else {
                BoxFormat::Xyxy
            };
            let boxes: Vec<BoundingBox> = boxes
                .iter()
                .map(|&coords| BoundingBox { coords, format })
                .collect();
            let style = BoxStyle {
                labels,
                font: font.as_deref(),
                colors,
            };
            bbox(input, output, &boxes, &style, *quality)
        }
    }
}

fn noise(input: &Path, output: &Path, step: i64, config: &NoiseConfig) -> Result<()> {
    ensure_exists(input)?;

    let injector = config.injector().context("Invalid noise configuration")?;
    let img = load_image(input).context("Failed to load input image")?;

    tracing::info!(
        "Noising {} at step {step}/{} (beta {})",
        input.display(),
        config.max_steps,
        config.beta
    );

    let mut rng = config.rng();
    let noised = injector
        .apply(&DenseImage::from(img), step, &mut rng)
        .context("Failed to add noise")?;
    let Some(noised) = noised.into_image() else {
        anyhow::bail!("noise injector returned a non-image result");
    };

    save_image(&noised, output, config.output_quality).context("Failed to save output image")?;

    println!(
        "Successfully processed {} -> {}",
        input.display(),
        output.display()
    );
    Ok(())
}

fn crop(dir: &Path, size: u32) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let report = crop_square_dir(dir, size).context("Failed to crop images")?;

    println!(
        "Cropped {} images in {} ({} skipped)",
        report.processed,
        dir.display(),
        report.skipped
    );
    Ok(())
}

/// Optional decoration for the `bbox` subcommand.
struct BoxStyle<'a> {
    labels: &'a [String],
    font: Option<&'a Path>,
    colors: &'a [Rgb<u8>],
}

fn bbox(
    input: &Path,
    output: &Path,
    boxes: &[BoundingBox],
    style: &BoxStyle<'_>,
    quality: u8,
) -> Result<()> {
    ensure_exists(input)?;

    let font = style
        .font
        .map(load_font)
        .transpose()
        .context("Failed to load label font")?;
    let labels = font.as_ref().map(|font| BoxLabels::new(style.labels, font));
    let colors = (!style.colors.is_empty()).then_some(style.colors);

    let mut canvas = load_image(input)
        .context("Failed to load input image")?
        .to_rgb8();
    draw_bboxes(&mut canvas, boxes, colors, labels.as_ref())
        .context("Failed to draw bounding boxes")?;

    save_image(&DynamicImage::ImageRgb8(canvas), output, quality)
        .context("Failed to save output image")?;

    println!(
        "Drew {} boxes on {} -> {}",
        boxes.len(),
        input.display(),
        output.display()
    );
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    Ok(())
}

fn parse_box(value: &str) -> std::result::Result<[f32; 4], String> {
    let coords = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid coordinate in {value:?}: {err}"))?;

    <[f32; 4]>::try_from(coords)
        .map_err(|coords| format!("expected 4 comma-separated numbers, got {}", coords.len()))
}

fn parse_color(value: &str) -> std::result::Result<Rgb<u8>, String> {
    let channels = value
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid channel in {value:?}: {err}"))?;

    <[u8; 3]>::try_from(channels)
        .map(Rgb)
        .map_err(|channels| format!("expected 3 comma-separated channels, got {}", channels.len()))
}
