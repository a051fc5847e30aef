//! Bounding-box fit and power-of-two subsample selection.
//!
//! Pure arithmetic: nothing here touches pixels or the filesystem, so the
//! decode backends can stay behind [`crate::decode::ImageBackend`].

use crate::error::{Error, Result};

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Output of [`compute_fit`]: the exact final size plus the decoder hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    pub target_width: u32,
    pub target_height: u32,
    /// Power-of-two divisor to request from the decoder.
    pub subsample: u32,
    /// Uniform scale from the original to the target size.
    pub scale: f64,
}

impl FitResult {
    pub fn target(&self) -> Dimensions {
        Dimensions::new(self.target_width, self.target_height)
    }
}

/// Fit `original` inside a `box_width` x `box_height` box, preserving aspect
/// ratio, and pick the largest power-of-two subsample that keeps the decoded
/// image at least as large as the target in both dimensions.
///
/// The smaller of the two axis ratios binds. Equal ratios bind to height.
/// Upscaling is allowed when the box is larger than the original.
///
/// # Errors
/// [`Error::InvalidArgument`] if either box dimension is zero,
/// [`Error::ZeroDimension`] if either original dimension is zero.
pub fn compute_fit(original: Dimensions, box_width: u32, box_height: u32) -> Result<FitResult> {
    validate_box(box_width, box_height)?;
    if original.width == 0 || original.height == 0 {
        return Err(Error::ZeroDimension {
            width: original.width,
            height: original.height,
        });
    }

    let height_ratio = box_height as f64 / original.height as f64;
    let width_ratio = box_width as f64 / original.width as f64;

    let (scale, target_width, target_height) = if height_ratio > width_ratio {
        (
            width_ratio,
            box_width,
            scaled_side(width_ratio, original.height),
        )
    } else {
        (
            height_ratio,
            scaled_side(height_ratio, original.width),
            box_height,
        )
    };

    let subsample = subsample_for(original, target_width, target_height);

    Ok(FitResult {
        target_width,
        target_height,
        subsample,
        scale,
    })
}

/// Reject empty bounding boxes.
pub fn validate_box(box_width: u32, box_height: u32) -> Result<()> {
    if box_width == 0 || box_height == 0 {
        return Err(Error::InvalidArgument(format!(
            "bounding box must be positive, got {box_width}x{box_height}"
        )));
    }
    Ok(())
}

// Never rounds to zero; a 10000x1 strip in a 10x10 box still gets one row.
fn scaled_side(scale: f64, side: u32) -> u32 {
    (scale * side as f64).round().max(1.0) as u32
}

fn subsample_for(original: Dimensions, target_width: u32, target_height: u32) -> u32 {
    let mut sample = 1u32;
    let mut sample_w = original.width;
    let mut sample_h = original.height;
    while sample_w / 2 >= target_width && sample_h / 2 >= target_height {
        sample_w /= 2;
        sample_h /= 2;
        sample *= 2;
    }
    sample
}
