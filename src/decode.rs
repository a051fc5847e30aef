//! Decode capability and the `image`/`jpeg-decoder` backed implementation.
//!
//! [`ImageBackend`] is the seam between the pure fit arithmetic and anything
//! that touches encoded bytes. [`FileBackend`] reads headers for bounds,
//! uses DCT-domain scaling for JPEG sources and falls back to a full decode
//! plus box averaging for everything else.

use std::fs;
use std::io::{BufRead, BufReader, Cursor, Read, Seek};
use std::path::PathBuf;
use std::sync::Arc;

use image::{ImageFormat, ImageReader, RgbaImage};
use jpeg_decoder::{Decoder as JpegDecoder, PixelFormat};
use tracing::debug;

use crate::error::{Error, Result};
use crate::processing::fit::Dimensions;
use crate::processing::resample::{self, ResampleFilter};
use crate::processing::subsample::{box_subsample, validate_subsample};

/// Opaque handle to an encoded image.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Memory { name: String, bytes: Arc<[u8]> },
}

impl ImageSource {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Human-readable label used in logs and errors.
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Memory { name, .. } => name.clone(),
        }
    }

    /// Sniff the container format from the content.
    pub fn format(&self) -> Result<Option<ImageFormat>> {
        match self {
            Self::Path(path) => Ok(ImageReader::open(path)?.with_guessed_format()?.format()),
            Self::Memory { bytes, .. } => Ok(ImageReader::new(Cursor::new(&bytes[..]))
                .with_guessed_format()?
                .format()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// The three operations the scaler needs from a platform decoder.
pub trait ImageBackend {
    /// Read dimensions from the header only; no pixel buffer is allocated.
    fn decode_bounds(&self, source: &ImageSource) -> Result<Dimensions>;

    /// Decode pixels at roughly `1 / subsample` of the original resolution.
    /// The returned buffer's size may differ slightly from the ideal.
    fn decode_subsampled(&self, source: &ImageSource, subsample: u32) -> Result<RgbaImage>;

    /// Scale `image` independently on each axis to exactly `width` x `height`.
    fn resample(&self, image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage>;
}

/// Production backend over the `image`, `jpeg-decoder` and `fast_image_resize` crates.
#[derive(Debug, Clone)]
pub struct FileBackend {
    filter: ResampleFilter,
    jpeg_fast_path: bool,
}

impl Default for FileBackend {
    fn default() -> Self {
        Self {
            filter: ResampleFilter::default(),
            jpeg_fast_path: true,
        }
    }
}

impl FileBackend {
    pub fn new(filter: ResampleFilter, jpeg_fast_path: bool) -> Self {
        Self {
            filter,
            jpeg_fast_path,
        }
    }

    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    // `format` comes from the caller's sniff so the source is not probed twice.
    fn decode_full(&self, source: &ImageSource, format: Option<ImageFormat>) -> Result<RgbaImage> {
        let decoded = match source {
            ImageSource::Path(path) => with_format(ImageReader::open(path)?, format)?.decode(),
            ImageSource::Memory { bytes, .. } => {
                with_format(ImageReader::new(Cursor::new(&bytes[..])), format)?.decode()
            }
        };
        decoded
            .map(|img| img.into_rgba8())
            .map_err(|err| Error::decode(source.name(), err))
    }

    fn subsample_with_fallback<F>(
        &self,
        source: &ImageSource,
        subsample: u32,
        format: Option<ImageFormat>,
        fast_path: Option<F>,
    ) -> Result<RgbaImage>
    where
        F: FnOnce() -> Result<RgbaImage>,
    {
        if let Some(fast) = fast_path {
            match fast() {
                Ok(img) => return Ok(img),
                Err(err) => {
                    debug!(
                        source = %source.name(),
                        "scaled JPEG decode failed, falling back to full decode: {err}"
                    );
                }
            }
        }

        let full = self.decode_full(source, format)?;
        let img = box_subsample(&full, subsample);
        debug!(
            source = %source.name(),
            subsample,
            width = img.width(),
            height = img.height(),
            "decoded and box-subsampled"
        );
        Ok(img)
    }

    fn decode_jpeg_scaled(&self, source: &ImageSource, subsample: u32) -> Result<RgbaImage> {
        match source {
            ImageSource::Path(path) => {
                let file = fs::File::open(path)?;
                decode_jpeg_scaled_from(BufReader::new(file), &source.name(), subsample)
            }
            ImageSource::Memory { bytes, .. } => {
                decode_jpeg_scaled_from(Cursor::new(&bytes[..]), &source.name(), subsample)
            }
        }
    }
}

impl ImageBackend for FileBackend {
    fn decode_bounds(&self, source: &ImageSource) -> Result<Dimensions> {
        let dims = match source {
            ImageSource::Path(path) => ImageReader::open(path)?
                .with_guessed_format()?
                .into_dimensions(),
            ImageSource::Memory { bytes, .. } => ImageReader::new(Cursor::new(&bytes[..]))
                .with_guessed_format()?
                .into_dimensions(),
        };
        let (width, height) = dims.map_err(|err| Error::decode(source.name(), err))?;
        debug!(source = %source.name(), width, height, "decoded bounds");
        Ok(Dimensions::new(width, height))
    }

    fn decode_subsampled(&self, source: &ImageSource, subsample: u32) -> Result<RgbaImage> {
        validate_subsample(subsample)?;

        let format = source.format()?;
        let use_dct = self.jpeg_fast_path && subsample > 1 && format == Some(ImageFormat::Jpeg);
        let fast_path = use_dct.then_some(|| self.decode_jpeg_scaled(source, subsample));
        self.subsample_with_fallback(source, subsample, format, fast_path)
    }

    fn resample(&self, image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
        resample::resample(image, width, height, self.filter)
    }
}

fn with_format<R: BufRead + Seek>(
    mut reader: ImageReader<R>,
    format: Option<ImageFormat>,
) -> std::io::Result<ImageReader<R>> {
    match format {
        Some(format) => {
            reader.set_format(format);
            Ok(reader)
        }
        None => reader.with_guessed_format(),
    }
}

/// Output of the DCT-domain stage and the divisor it achieved.
struct DctStage {
    image: RgbaImage,
    factor: u32,
}

// Box-average whatever factor the DCT could not provide (it stops at 1/8).
fn decode_jpeg_scaled_from<R: Read>(reader: R, name: &str, subsample: u32) -> Result<RgbaImage> {
    let stage = decode_jpeg_dct(reader, name, subsample)?;
    let remaining = (subsample / stage.factor).max(1);
    debug!(
        source = name,
        subsample,
        dct_factor = stage.factor,
        remaining,
        width = stage.image.width(),
        height = stage.image.height(),
        "decoded JPEG with DCT scaling"
    );
    Ok(box_subsample(&stage.image, remaining))
}

// Ask jpeg-decoder for its smallest DCT scale that still covers 1/subsample.
fn decode_jpeg_dct<R: Read>(reader: R, name: &str, subsample: u32) -> Result<DctStage> {
    let mut decoder = JpegDecoder::new(reader);
    decoder
        .read_info()
        .map_err(|err| Error::decode(name, jpeg_message(err)))?;
    let info = decoder
        .info()
        .ok_or_else(|| Error::decode(name, "missing JPEG header"))?;
    let (orig_w, orig_h) = (info.width as u32, info.height as u32);

    let request_w = orig_w.div_ceil(subsample).clamp(1, u16::MAX as u32) as u16;
    let request_h = orig_h.div_ceil(subsample).clamp(1, u16::MAX as u32) as u16;
    decoder
        .scale(request_w, request_h)
        .map_err(|err| Error::decode(name, jpeg_message(err)))?;
    let pixels = decoder
        .decode()
        .map_err(|err| Error::decode(name, jpeg_message(err)))?;
    let info = decoder
        .info()
        .ok_or_else(|| Error::decode(name, "missing JPEG header after decode"))?;
    let (width, height) = (info.width as u32, info.height as u32);

    let rgba = to_rgba(&pixels, info.pixel_format, name)?;
    let image = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| Error::decode(name, "JPEG pixel buffer has unexpected length"))?;
    Ok(DctStage {
        image,
        factor: dct_factor(orig_w, width),
    })
}

fn dct_factor(orig_w: u32, scaled_w: u32) -> u32 {
    let mut factor = 1;
    while factor < 8 && orig_w.div_ceil(factor * 2) >= scaled_w {
        factor *= 2;
    }
    factor
}

fn jpeg_message(err: jpeg_decoder::Error) -> String {
    match err {
        jpeg_decoder::Error::Unsupported(feature) => format!("unsupported JPEG feature: {feature:?}"),
        other => other.to_string(),
    }
}

fn to_rgba(pixels: &[u8], format: PixelFormat, name: &str) -> Result<Vec<u8>> {
    let rgba = match format {
        PixelFormat::RGB24 => {
            let mut rgba = Vec::with_capacity(pixels.len() / 3 * 4);
            for chunk in pixels.chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
            rgba
        }
        PixelFormat::L8 => {
            let mut rgba = Vec::with_capacity(pixels.len() * 4);
            for &v in pixels {
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
            rgba
        }
        PixelFormat::CMYK32 => {
            let mut rgba = Vec::with_capacity(pixels.len());
            for chunk in pixels.chunks_exact(4) {
                let k = chunk[3] as f32 / 255.0;
                let ink = |v: u8| {
                    let c = (v as f32 / 255.0) * (1.0 - k) + k;
                    ((1.0 - c) * 255.0).round().clamp(0.0, 255.0) as u8
                };
                rgba.extend_from_slice(&[ink(chunk[0]), ink(chunk[1]), ink(chunk[2]), 255]);
            }
            rgba
        }
        PixelFormat::L16 => {
            return Err(Error::decode(
                name,
                "16-bit grayscale JPEGs are not supported by the scaled decoder",
            ));
        }
    };
    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 4 % 256) as u8, (y * 5 % 256) as u8, 90])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn dct_stage_covers_up_to_one_eighth() {
        let bytes = jpeg_bytes(64, 48);

        let stage = decode_jpeg_dct(Cursor::new(&bytes[..]), "t", 4).unwrap();
        assert_eq!(stage.image.dimensions(), (16, 12));
        assert_eq!(stage.factor, 4);
        let out = decode_jpeg_scaled_from(Cursor::new(&bytes[..]), "t", 4).unwrap();
        assert_eq!(out.dimensions(), (16, 12));

        // 1/8 is the DCT limit; the last halving is box-averaged.
        let stage = decode_jpeg_dct(Cursor::new(&bytes[..]), "t", 16).unwrap();
        assert_eq!(stage.image.dimensions(), (8, 6));
        assert_eq!(stage.factor, 8);
        let out = decode_jpeg_scaled_from(Cursor::new(&bytes[..]), "t", 16).unwrap();
        assert_eq!(out.dimensions(), (4, 3));
    }

    #[test]
    fn dct_stage_rounds_short_side_up() {
        let bytes = jpeg_bytes(1000, 3);
        let stage = decode_jpeg_dct(Cursor::new(&bytes[..]), "t", 2).unwrap();
        assert_eq!(stage.image.dimensions(), (500, 2));
        assert_eq!(stage.factor, 2);
    }

    #[test]
    fn jpeg_subsampled_decode_takes_dct_path() {
        let bytes = jpeg_bytes(64, 48);
        let expected = decode_jpeg_scaled_from(Cursor::new(&bytes[..]), "t", 4).unwrap();
        let src = ImageSource::from_bytes("photo.jpg", bytes);
        let out = FileBackend::default().decode_subsampled(&src, 4).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn failing_fast_path_falls_back_to_full_decode() {
        let src = ImageSource::from_bytes("photo.jpg", jpeg_bytes(64, 48));
        let out = FileBackend::default()
            .subsample_with_fallback(
                &src,
                4,
                Some(ImageFormat::Jpeg),
                Some(|| Err(Error::decode("photo.jpg", "forced failure"))),
            )
            .unwrap();
        assert_eq!(out.dimensions(), (16, 12));
    }

    #[test]
    fn successful_fast_path_skips_full_decode() {
        // A full decode of these bytes would fail, so success means no fallback ran.
        let src = ImageSource::from_bytes("junk", vec![0u8; 8]);
        let out = FileBackend::default()
            .subsample_with_fallback(&src, 4, None, Some(|| Ok(RgbaImage::new(1, 1))))
            .unwrap();
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn full_decode_uses_the_given_format() {
        let src = ImageSource::from_bytes("tile.png", png_bytes(6, 4));
        let backend = FileBackend::default();
        let img = backend.decode_full(&src, Some(ImageFormat::Png)).unwrap();
        assert_eq!(img.dimensions(), (6, 4));
        let err = backend
            .decode_full(&src, Some(ImageFormat::Jpeg))
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    }

    #[test]
    fn dct_factor_tracks_decoder_output() {
        assert_eq!(dct_factor(640, 640), 1);
        assert_eq!(dct_factor(640, 320), 2);
        assert_eq!(dct_factor(640, 80), 8);
        assert_eq!(dct_factor(641, 81), 8);
        assert_eq!(dct_factor(100, 25), 4);
    }

    #[test]
    fn grayscale_expands_to_opaque_rgba() {
        let out = to_rgba(&[7, 200], PixelFormat::L8, "t").unwrap();
        assert_eq!(out, vec![7, 7, 7, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn memory_source_reports_its_name() {
        let src = ImageSource::from_bytes("inline.png", vec![1u8, 2, 3]);
        assert_eq!(src.name(), "inline.png");
    }

    #[test]
    fn garbage_bytes_fail_bounds_with_decode_error() {
        let src = ImageSource::from_bytes("junk", b"definitely not an image".to_vec());
        let err = FileBackend::default().decode_bounds(&src).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    }

    #[test]
    fn non_power_of_two_subsample_is_rejected() {
        let src = ImageSource::from_bytes("junk", vec![0u8; 4]);
        let err = FileBackend::default()
            .decode_subsampled(&src, 3)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
