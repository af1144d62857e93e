//! Parameter types for image operations.
//!
//! These types describe *what* to produce, not *how*. They are the interface
//! between the [`operations`](super::operations) module (which decides which
//! renders a stage needs) and the [`backend`](super::backend) (which does the
//! pixel work).
//!
//! ## Types
//!
//! - [`OutputFormat`]: the closed set of encode targets (png, webp, jpeg, tiff).
//! - [`ResizeFit`]: how the source maps onto a target box (cover, contain, fill).
//! - [`Quality`]: lossy encoding quality (1–100). Clamped on construction.
//! - [`EncodeOptions`]: per-format encoder settings, deserialized from the
//!   camelCase option objects users put under `formats`.
//! - [`parse_css_color`]: hex, `rgb()`, `hsl()` and named CSS colors.

use super::backend::BackendError;
use image::Rgba;
use palette::{FromColor, Hsl, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Encode target for a generated icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Webp,
    Jpeg,
    Tiff,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Png,
        OutputFormat::Webp,
        OutputFormat::Jpeg,
        OutputFormat::Tiff,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Tiff => "tiff",
        }
    }

    /// MIME type used in manifest icon entries.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Tiff => "image/tiff",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a source image is mapped onto a target bounding box when aspect
/// ratios differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFit {
    /// Fill the box, cropping the overflow around the center.
    #[default]
    Cover,
    /// Fit inside the box, letterboxed on a transparent background.
    Contain,
    /// Stretch to the exact box, ignoring aspect ratio.
    Fill,
}

impl ResizeFit {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cover" => Some(ResizeFit::Cover),
            "contain" => Some(ResizeFit::Contain),
            "fill" => Some(ResizeFit::Fill),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResizeFit::Cover => "cover",
            ResizeFit::Contain => "contain",
            ResizeFit::Fill => "fill",
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

/// PNG encoder settings.
///
/// `compressionLevel` follows zlib's 0–9 scale; the backend maps it onto the
/// encoder's fast / default / best presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PngOptions {
    pub compression_level: u8,
    pub adaptive_filtering: bool,
}

impl Default for PngOptions {
    fn default() -> Self {
        Self {
            compression_level: 9,
            adaptive_filtering: true,
        }
    }
}

/// WebP encoder settings.
///
/// The pure-Rust encoder only writes lossless WebP, so `lossless` defaults to
/// true. `quality` and `reductionEffort` are carried for hosts with a lossy
/// encoder; [`RustBackend`](super::RustBackend) ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebpOptions {
    pub quality: Quality,
    pub lossless: bool,
    #[serde(alias = "effort")]
    pub reduction_effort: u8,
}

impl Default for WebpOptions {
    fn default() -> Self {
        Self {
            quality: Quality::new(60),
            lossless: true,
            reduction_effort: 6,
        }
    }
}

/// JPEG encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JpegOptions {
    pub quality: Quality,
}

/// TIFF encoder settings. The encoder has no tunables; any keys are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TiffOptions {}

/// Encoder settings for one output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOptions {
    Png(PngOptions),
    Webp(WebpOptions),
    Jpeg(JpegOptions),
    Tiff(TiffOptions),
}

impl EncodeOptions {
    pub fn format(&self) -> OutputFormat {
        match self {
            EncodeOptions::Png(_) => OutputFormat::Png,
            EncodeOptions::Webp(_) => OutputFormat::Webp,
            EncodeOptions::Jpeg(_) => OutputFormat::Jpeg,
            EncodeOptions::Tiff(_) => OutputFormat::Tiff,
        }
    }

    /// Built-in settings for a format.
    pub fn defaults_for(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => EncodeOptions::Png(PngOptions::default()),
            OutputFormat::Webp => EncodeOptions::Webp(WebpOptions::default()),
            OutputFormat::Jpeg => EncodeOptions::Jpeg(JpegOptions::default()),
            OutputFormat::Tiff => EncodeOptions::Tiff(TiffOptions::default()),
        }
    }

    /// Deserialize a user-supplied option object for `format`.
    ///
    /// Keys absent from the object take the encoder's own defaults, not the
    /// built-in table's: a user entry replaces the built-in entry wholesale.
    pub fn from_value(
        format: OutputFormat,
        value: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let value = value.clone();
        Ok(match format {
            OutputFormat::Png => EncodeOptions::Png(serde_json::from_value(value)?),
            OutputFormat::Webp => EncodeOptions::Webp(serde_json::from_value(value)?),
            OutputFormat::Jpeg => EncodeOptions::Jpeg(serde_json::from_value(value)?),
            OutputFormat::Tiff => EncodeOptions::Tiff(serde_json::from_value(value)?),
        })
    }
}

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Parse a CSS color.
///
/// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `transparent`, CSS named
/// colors, and the `rgb()`/`rgba()`/`hsl()`/`hsla()` functions in both the
/// comma-separated and the space-separated (`rgb(0 0 0 / 50%)`) syntax.
pub fn parse_css_color(input: &str) -> Result<Rgba<u8>, BackendError> {
    let color = input.trim().to_ascii_lowercase();
    let unsupported = || BackendError::UnsupportedColor(input.to_string());

    if color == "transparent" {
        return Ok(TRANSPARENT);
    }
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(unsupported);
    }
    if let Some((name, args)) = functional_args(&color) {
        let parsed = match name {
            "rgb" | "rgba" => parse_rgb_args(&args),
            "hsl" | "hsla" => parse_hsl_args(&args),
            _ => None,
        };
        return parsed.ok_or_else(unsupported);
    }
    palette::named::from_str(&color)
        .map(|rgb| Rgba([rgb.red, rgb.green, rgb.blue, 255]))
        .ok_or_else(unsupported)
}

/// Hex digits after the `#`. The 4- and 8-digit forms carry alpha last.
fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.is_ascii() {
        return None;
    }
    let (rgb, alpha) = match hex.len() {
        3 | 6 => (hex, None),
        4 => (&hex[..3], Some(hex[3..].repeat(2))),
        8 => (&hex[..6], Some(hex[6..].to_string())),
        _ => return None,
    };
    let rgb: Srgb<u8> = rgb.parse().ok()?;
    let alpha = match alpha {
        Some(a) => u8::from_str_radix(&a, 16).ok()?,
        None => 255,
    };
    Some(Rgba([rgb.red, rgb.green, rgb.blue, alpha]))
}

/// Split `name(...)` into the function name and its arguments. Commas,
/// whitespace and the `/` alpha separator all delimit arguments.
fn functional_args(color: &str) -> Option<(&str, Vec<&str>)> {
    let (name, rest) = color.split_once('(')?;
    let inner = rest.strip_suffix(')')?;
    let args = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|arg| !arg.is_empty())
        .collect();
    Some((name.trim(), args))
}

/// A number, or a percentage of `full`.
fn number_or_percent(arg: &str, full: f32) -> Option<f32> {
    let value = match arg.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0 * full,
        None => arg.parse::<f32>().ok()?,
    };
    value.is_finite().then_some(value)
}

fn alpha_arg(arg: Option<&&str>) -> Option<u8> {
    let Some(arg) = arg else {
        return Some(255);
    };
    let alpha = number_or_percent(arg, 1.0)?;
    (0.0..=1.0)
        .contains(&alpha)
        .then(|| (alpha * 255.0).round() as u8)
}

fn parse_rgb_args(args: &[&str]) -> Option<Rgba<u8>> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    let channel = |arg: &str| {
        let value = number_or_percent(arg, 255.0)?;
        (0.0..=255.0).contains(&value).then(|| value.round() as u8)
    };
    Some(Rgba([
        channel(args[0])?,
        channel(args[1])?,
        channel(args[2])?,
        alpha_arg(args.get(3))?,
    ]))
}

/// Hue in degrees; `deg`, `rad`, `grad` and `turn` units are accepted.
fn hue_degrees(arg: &str) -> Option<f32> {
    let units: [(&str, f32); 4] = [
        ("deg", 1.0),
        ("grad", 0.9),
        ("rad", 180.0 / std::f32::consts::PI),
        ("turn", 360.0),
    ];
    let (number, scale) = units
        .iter()
        .find_map(|(unit, scale)| arg.strip_suffix(unit).map(|n| (n, *scale)))
        .unwrap_or((arg, 1.0));
    let degrees = number.parse::<f32>().ok()? * scale;
    degrees.is_finite().then_some(degrees)
}

fn parse_hsl_args(args: &[&str]) -> Option<Rgba<u8>> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    // Saturation and lightness are percentages, with or without the `%`.
    let fraction = |arg: &str| {
        let value = arg.strip_suffix('%').unwrap_or(arg).parse::<f32>().ok()? / 100.0;
        (0.0..=1.0).contains(&value).then_some(value)
    };
    let hsl: Hsl = Hsl::new(hue_degrees(args[0])?, fraction(args[1])?, fraction(args[2])?);
    let rgb: Srgb = Srgb::from_color(hsl);
    let rgb: Srgb<u8> = rgb.into_format();
    Some(Rgba([rgb.red, rgb.green, rgb.blue, alpha_arg(args.get(3))?]))
}
