use fast_image_resize as fir;
use image::RgbaImage;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Reconstruction filter used for the final exact-size pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl Default for ResampleFilter {
    fn default() -> Self {
        Self::Bilinear
    }
}

impl ResampleFilter {
    fn algorithm(self) -> fir::ResizeAlg {
        match self {
            Self::Nearest => fir::ResizeAlg::Nearest,
            Self::Bilinear => fir::ResizeAlg::Convolution(fir::FilterType::Bilinear),
            Self::CatmullRom => fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom),
            Self::Lanczos3 => fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3),
        }
    }
}

/// Independent horizontal and vertical scale applied by [`resample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    pub fn between(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Self {
        Self {
            x: dst_w as f64 / src_w.max(1) as f64,
            y: dst_h as f64 / src_h.max(1) as f64,
        }
    }
}

/// Resample `source` to exactly `target_w` x `target_h`.
///
/// The two axes scale independently so a subsampled buffer whose size drifted
/// from the ideal still lands on the requested pixel grid.
pub fn resample(
    source: &RgbaImage,
    target_w: u32,
    target_h: u32,
    filter: ResampleFilter,
) -> Result<RgbaImage> {
    if target_w == 0 || target_h == 0 {
        return Err(Error::InvalidArgument(format!(
            "resample target must be positive, got {target_w}x{target_h}"
        )));
    }
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .map_err(|err| Error::Resize(format!("invalid source buffer: {err}")))?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new().resize_alg(filter.algorithm());
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .map_err(|err| Error::Resize(err.to_string()))?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| Error::Resize("resized buffer has unexpected length".into()))
}
