use image::RgbaImage;

use crate::error::{Error, Result};

/// Check that `factor` is a usable decoder subsample: a power of two, at least 1.
pub fn validate_subsample(factor: u32) -> Result<()> {
    if !factor.is_power_of_two() {
        return Err(Error::InvalidArgument(format!(
            "subsample must be a power of two >= 1, got {factor}"
        )));
    }
    Ok(())
}

/// Box-average `img` down by an integer `factor`.
///
/// Output is `floor(w / factor) x floor(h / factor)`, clamped to 1x1. Trailing
/// columns/rows that do not fill a whole block are dropped, except when the
/// image is smaller than one block, in which case the whole image averages
/// into a single pixel.
pub fn box_subsample(img: &RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    let out_w = (w / factor).max(1);
    let out_h = (h / factor).max(1);
    let block_w = factor.min(w);
    let block_h = factor.min(h);

    let mut out = RgbaImage::new(out_w, out_h);
    for (ox, oy, px) in out.enumerate_pixels_mut() {
        let x0 = ox * factor;
        let y0 = oy * factor;
        let mut accum = [0u64; 4];
        for y in y0..y0 + block_h {
            for x in x0..x0 + block_w {
                let p = img.get_pixel(x, y);
                for c in 0..4 {
                    accum[c] += p[c] as u64;
                }
            }
        }
        let n = (block_w as u64) * (block_h as u64);
        for c in 0..4 {
            px[c] = ((accum[c] + n / 2) / n) as u8;
        }
    }
    out
}
