//! Binary entrypoint for rust-photo-scaler.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use image::{DynamicImage, ImageFormat};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use rust_photo_scaler::{ImageSource, config, scale_to_fit};

/// Fit an image inside a bounding box using subsampled decoding.
#[derive(Debug, Parser)]
#[command(name = "rust-photo-scaler", about = "Memory-efficient image downscaler")]
struct Cli {
    /// Image to read
    input: PathBuf,

    /// Where to write the scaled image (same format as the input)
    output: PathBuf,

    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override bounding box width
    #[arg(long, value_name = "PX")]
    width: Option<u32>,

    /// Override bounding box height
    #[arg(long, value_name = "PX")]
    height: Option<u32>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("rust_photo_scaler={level}").parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = config::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(w) = cli.width {
        cfg.box_width = w;
    }
    if let Some(h) = cli.height {
        cfg.box_height = h;
    }
    cfg.validate().context("validating configuration")?;

    let source = ImageSource::Path(cli.input.clone());
    let format = source
        .format()
        .with_context(|| format!("reading {}", cli.input.display()))?
        .with_context(|| format!("unrecognized image format: {}", cli.input.display()))?;

    let backend = cfg.backend();
    let scaled = scale_to_fit(&backend, &source, cfg.box_width, cfg.box_height)
        .with_context(|| format!("scaling {}", cli.input.display()))?;
    info!(
        original_w = scaled.original.width,
        original_h = scaled.original.height,
        width = scaled.fit.target_width,
        height = scaled.fit.target_height,
        subsample = scaled.fit.subsample,
        "scaled image"
    );

    let image = DynamicImage::ImageRgba8(scaled.into_image());
    // The JPEG encoder has no alpha channel.
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    image
        .save_with_format(&cli.output, format)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    Ok(())
}
