//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` (format guessed from content) |
//! | Resize `cover` | `DynamicImage::resize_to_fill` (Lanczos3, center crop) |
//! | Resize `contain` | `DynamicImage::resize` + `imageops::overlay` on a transparent canvas |
//! | Resize `fill` | `DynamicImage::resize_exact` |
//! | Pad | `imageops::overlay` on a larger transparent canvas |
//! | Flatten | per-pixel alpha blend onto the background, RGB output |
//! | Encode | `PngEncoder`, `WebPEncoder` (lossless), `JpegEncoder`, `TiffEncoder` |

use super::backend::{BackendError, ImageBackend};
use super::params::{EncodeOptions, PngOptions, ResizeFit, TRANSPARENT};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest canvas the backend will allocate, in pixels.
pub const MAX_OUTPUT_PIXELS: u64 = 64 * 1024 * 1024;

fn check_dimensions(width: u32, height: u32) -> Result<(), BackendError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels == 0 || pixels > MAX_OUTPUT_PIXELS {
        return Err(BackendError::ProcessingFailed(format!(
            "Cannot produce a {width}x{height} image"
        )));
    }
    Ok(())
}

fn processing(context: &str, err: impl std::fmt::Display) -> BackendError {
    BackendError::ProcessingFailed(format!("{context}: {err}"))
}

/// Center `top` on a transparent `width`×`height` canvas.
fn center_on_canvas(top: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let x = (width.saturating_sub(top.width()) / 2) as i64;
    let y = (height.saturating_sub(top.height()) / 2) as i64;
    imageops::overlay(&mut canvas, &top.to_rgba8(), x, y);
    DynamicImage::ImageRgba8(canvas)
}

fn blend_channel(src: u8, bg: u8, alpha: f32) -> u8 {
    (src as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8
}

fn png_encoder_settings(options: &PngOptions) -> (CompressionType, PngFilter) {
    let compression = match options.compression_level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    };
    let filter = if options.adaptive_filtering {
        PngFilter::Adaptive
    } else {
        PngFilter::NoFilter
    };
    (compression, filter)
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn open(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| processing(&format!("Failed to decode {}", path.display()), e))?;
        Ok(DynamicImage::ImageRgba8(img.to_rgba8()))
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        fit: ResizeFit,
    ) -> Result<DynamicImage, BackendError> {
        check_dimensions(width, height)?;
        Ok(match fit {
            ResizeFit::Cover => image.resize_to_fill(width, height, FilterType::Lanczos3),
            ResizeFit::Fill => image.resize_exact(width, height, FilterType::Lanczos3),
            ResizeFit::Contain => {
                let fitted = image.resize(width, height, FilterType::Lanczos3);
                center_on_canvas(&fitted, width, height)
            }
        })
    }

    fn pad(&self, image: &DynamicImage, padding: u32) -> Result<DynamicImage, BackendError> {
        let grow = |side: u32| padding.checked_mul(2).and_then(|p| side.checked_add(p));
        let (Some(width), Some(height)) = (grow(image.width()), grow(image.height())) else {
            return Err(BackendError::ProcessingFailed(format!(
                "Cannot pad by {padding}px"
            )));
        };
        check_dimensions(width, height)?;
        Ok(center_on_canvas(image, width, height))
    }

    fn flatten(
        &self,
        image: &DynamicImage,
        background: Rgba<u8>,
    ) -> Result<DynamicImage, BackendError> {
        let rgba = image.to_rgba8();
        let [br, bg, bb, _] = background.0;
        let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let alpha = a as f32 / 255.0;
            Rgb([
                blend_channel(r, br, alpha),
                blend_channel(g, bg, alpha),
                blend_channel(b, bb, alpha),
            ])
        });
        Ok(DynamicImage::ImageRgb8(flat))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, BackendError> {
        let mut cursor = Cursor::new(Vec::new());
        let result = match options {
            EncodeOptions::Png(png) => {
                let (compression, filter) = png_encoder_settings(png);
                image.write_with_encoder(PngEncoder::new_with_quality(
                    &mut cursor,
                    compression,
                    filter,
                ))
            }
            EncodeOptions::Webp(webp) => {
                if !webp.lossless {
                    debug!(
                        quality = webp.quality.value(),
                        "lossy WebP requested, writing lossless"
                    );
                }
                image.write_with_encoder(WebPEncoder::new_lossless(&mut cursor))
            }
            EncodeOptions::Jpeg(jpeg) => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(
                    &mut cursor,
                    jpeg.quality.value() as u8,
                ))
            }
            EncodeOptions::Tiff(_) => image.write_with_encoder(TiffEncoder::new(&mut cursor)),
        };
        result.map_err(|e| processing(&format!("{} encode failed", options.format()), e))?;
        Ok(cursor.into_inner())
    }
}
