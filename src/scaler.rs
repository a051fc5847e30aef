//! Two-stage fit: subsampled decode, then an exact resample.

use image::RgbaImage;
use tracing::{debug, instrument};

use crate::decode::{ImageBackend, ImageSource};
use crate::error::Result;
use crate::processing::fit::{Dimensions, FitResult, compute_fit, validate_box};
use crate::processing::resample::ScaleFactors;

/// Final image together with the plan that produced it.
#[derive(Debug, Clone)]
pub struct ScaledImage {
    pub image: RgbaImage,
    pub fit: FitResult,
    pub original: Dimensions,
}

impl ScaledImage {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Downscale `source` to fit inside `box_width` x `box_height`.
///
/// Reads the header first, decodes at the largest safe power-of-two
/// subsample, then resamples to the exact target. The subsampled buffer is
/// dropped before returning.
///
/// # Errors
/// Box validation fails before the backend is touched. Decode failures and
/// zero-sized sources propagate unchanged.
#[instrument(skip(backend, source), fields(source = %source.name()))]
pub fn scale_to_fit<B>(
    backend: &B,
    source: &ImageSource,
    box_width: u32,
    box_height: u32,
) -> Result<ScaledImage>
where
    B: ImageBackend + ?Sized,
{
    validate_box(box_width, box_height)?;

    let original = backend.decode_bounds(source)?;
    let fit = compute_fit(original, box_width, box_height)?;
    debug!(
        original_w = original.width,
        original_h = original.height,
        target_w = fit.target_width,
        target_h = fit.target_height,
        subsample = fit.subsample,
        scale = fit.scale,
        "computed fit"
    );

    let sampled = backend.decode_subsampled(source, fit.subsample)?;
    let factors = ScaleFactors::between(
        sampled.width(),
        sampled.height(),
        fit.target_width,
        fit.target_height,
    );
    debug!(
        sampled_w = sampled.width(),
        sampled_h = sampled.height(),
        scale_x = factors.x,
        scale_y = factors.y,
        "resampling to target"
    );
    let image = backend.resample(&sampled, fit.target_width, fit.target_height)?;

    Ok(ScaledImage {
        image,
        fit,
        original,
    })
}
