//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take a
//! decoded base icon plus a description of the render, and return encoded
//! bytes. None of them mutate the base icon.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{APPLE_TOUCH_ICON_SIZE, apple_touch_artwork_size, size_label};
use super::params::{EncodeOptions, PngOptions, ResizeFit};
use image::Rgba;
use rayon::prelude::*;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// One (width, height, format) render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconSpec {
    pub width: u32,
    pub height: u32,
    pub options: EncodeOptions,
}

impl IconSpec {
    pub fn square(size: u32, options: EncodeOptions) -> Self {
        Self {
            width: size,
            height: size,
            options,
        }
    }

    /// `WxH`, as used in filenames and `sizes` attributes.
    pub fn size_label(&self) -> String {
        size_label(self.width, self.height)
    }
}

/// Resize a copy of `base` and encode it.
pub fn render_icon<B: ImageBackend>(
    backend: &B,
    base: &B::Image,
    spec: &IconSpec,
    fit: ResizeFit,
) -> Result<Vec<u8>> {
    let resized = backend.resize(base, spec.width, spec.height, fit)?;
    backend.encode(&resized, &spec.options)
}

/// Render every spec in parallel. Results come back in `specs` order.
pub fn render_icons<B: ImageBackend>(
    backend: &B,
    base: &B::Image,
    specs: &[IconSpec],
    fit: ResizeFit,
) -> Vec<Result<Vec<u8>>> {
    specs
        .par_iter()
        .map(|spec| render_icon(backend, base, spec, fit))
        .collect()
}

/// Settings for the padded, flattened Apple touch icon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppleTouchConfig {
    pub padding: u32,
    pub background: Rgba<u8>,
    pub fit: ResizeFit,
    pub png: PngOptions,
}

/// Render the 180×180 Apple touch icon.
///
/// The artwork is resized to `180 - 2 × padding`, padded back to 180 with
/// transparency, and only then flattened onto the background, so the padding
/// takes the background color too.
pub fn render_apple_touch_icon<B: ImageBackend>(
    backend: &B,
    base: &B::Image,
    config: &AppleTouchConfig,
) -> Result<Vec<u8>> {
    let artwork = apple_touch_artwork_size(config.padding).ok_or_else(|| {
        BackendError::ProcessingFailed(format!(
            "padding {} leaves no room in a {APPLE_TOUCH_ICON_SIZE}px icon",
            config.padding
        ))
    })?;
    let resized = backend.resize(base, artwork, artwork, config.fit)?;
    let padded = backend.pad(&resized, config.padding)?;
    let flat = backend.flatten(&padded, config.background)?;
    backend.encode(&flat, &EncodeOptions::Png(config.png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::params::{JpegOptions, OutputFormat, WebpOptions};
    use std::path::Path;

    fn png() -> EncodeOptions {
        EncodeOptions::Png(PngOptions::default())
    }

    #[test]
    fn render_icon_resizes_then_encodes() {
        let backend = MockBackend::new();
        let base = backend.open(Path::new("logo.png")).unwrap();

        let bytes = render_icon(&backend, &base, &IconSpec::square(96, png()), ResizeFit::Cover)
            .unwrap();

        assert_eq!(bytes, b"open:logo.png>resize:96x96:cover|png");
    }

    #[test]
    fn render_icon_leaves_base_untouched() {
        let backend = MockBackend::new();
        let base = backend.open(Path::new("logo.png")).unwrap();
        render_icon(&backend, &base, &IconSpec::square(48, png()), ResizeFit::Fill).unwrap();
        assert_eq!(base.steps, vec!["open:logo.png"]);
    }

    #[test]
    fn render_icons_preserves_spec_order() {
        let backend = MockBackend::new();
        let base = backend.open(Path::new("logo.png")).unwrap();
        let specs = [
            IconSpec::square(48, png()),
            IconSpec::square(48, EncodeOptions::Webp(WebpOptions::default())),
            IconSpec::square(96, EncodeOptions::Jpeg(JpegOptions::default())),
        ];

        let results = render_icons(&backend, &base, &specs, ResizeFit::Cover);

        let trails: Vec<String> = results
            .into_iter()
            .map(|r| String::from_utf8(r.unwrap()).unwrap())
            .collect();
        assert_eq!(
            trails,
            vec![
                "open:logo.png>resize:48x48:cover|png",
                "open:logo.png>resize:48x48:cover|webp",
                "open:logo.png>resize:96x96:cover|jpeg",
            ]
        );
    }

    #[test]
    fn render_icons_reports_failures_per_unit() {
        let backend = MockBackend::failing_on_width(16);
        let base = backend.open(Path::new("logo.png")).unwrap();
        let specs = [IconSpec::square(32, png()), IconSpec::square(16, png())];

        let results = render_icons(&backend, &base, &specs, ResizeFit::Cover);

        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn apple_touch_pads_before_flattening() {
        let backend = MockBackend::new();
        let base = backend.open(Path::new("logo.png")).unwrap();
        let config = AppleTouchConfig {
            padding: 12,
            background: Rgba([255, 255, 255, 255]),
            fit: ResizeFit::Cover,
            png: PngOptions::default(),
        };

        let bytes = render_apple_touch_icon(&backend, &base, &config).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "open:logo.png>resize:156x156:cover>pad:12>flatten:255,255,255|png"
        );
        let ops = backend.get_operations();
        assert_eq!(
            ops[1..],
            [
                RecordedOp::Resize {
                    width: 156,
                    height: 156,
                    fit: ResizeFit::Cover
                },
                RecordedOp::Pad(12),
                RecordedOp::Flatten([255, 255, 255, 255]),
                RecordedOp::Encode(OutputFormat::Png),
            ]
        );
    }

    #[test]
    fn apple_touch_rejects_oversized_padding() {
        let backend = MockBackend::new();
        let base = backend.open(Path::new("logo.png")).unwrap();
        let config = AppleTouchConfig {
            padding: 95,
            background: Rgba([0, 0, 0, 255]),
            fit: ResizeFit::Cover,
            png: PngOptions::default(),
        };
        assert!(render_apple_touch_icon(&backend, &base, &config).is_err());
    }
}
