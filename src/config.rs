//! Generator configuration.
//!
//! Raw options are a loosely-shaped JSON object (the "options bag"). They are
//! normalized by [`resolve`](crate::resolve) into the strict [`Configuration`]
//! defined here. This module also loads the bag from disk and ships the stock,
//! fully commented options file.
//!
//! ## Option Files
//!
//! | File | How it is read |
//! |------|----------------|
//! | `*.json` | The whole document is the options bag |
//! | `*.toml` | Parsed with `toml`, then converted to the same JSON value model |
//! | `package.json` | The `pwaManifest` key is the options bag |
//!
//! A `package.json` can also serve as the fallback-defaults object (see
//! [`package_fallback`]): its `name` and `description` fill in fields the
//! options bag leaves out.
//!
//! ## Minimal Options
//!
//! ```toml
//! name = "My App"
//!
//! [icons]
//! baseIcon = "src/icon.png"
//! ```
//!
//! Everything else has a default. Run `pwa-manifest gen-config` for the full
//! list with explanations.

pub use crate::fingerprint::HashMethod;
pub use crate::imaging::ResizeFit;

use crate::imaging::{AppleTouchConfig, EncodeOptions, OutputFormat, PngOptions};
use image::Rgba;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key under which a `package.json` carries the options bag.
pub const PACKAGE_JSON_KEY: &str = "pwaManifest";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{message}")]
    Missing { field: String, message: String },
    #[error("{message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub fn missing(field: &str, message: impl Into<String>) -> Self {
        ConfigError::Missing {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// The canonical name of the offending option, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Missing { field, .. } | ConfigError::Invalid { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

/// Secondary inputs that come from the host rather than the options bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    /// Public URL prefix every generated asset is served under.
    pub base_url: String,
    /// Directory the base icon path is resolved against.
    pub resolve_dir: PathBuf,
    /// Selects the per-environment override object, matched case-insensitively.
    pub environment: Option<String>,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            base_url: "/".to_string(),
            resolve_dir: PathBuf::from("."),
            environment: None,
        }
    }
}

/// Fully resolved, validated generator configuration.
///
/// Only [`resolve`](crate::resolve::resolve) builds one, and it either returns
/// a complete value or an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Generation is skipped entirely, with an all-empty result.
    pub disabled: bool,
    pub name: String,
    pub short_name: String,
    /// Omitted from the manifest when empty.
    pub description: String,
    pub start_url: String,
    pub scope: String,
    pub theme_color: String,
    pub base_url: String,
    /// How output filenames are fingerprinted.
    pub naming: HashMethod,
    pub icons: IconOptions,
    /// Validated well-known manifest fields followed by `include` passthroughs.
    pub extra_params: Map<String, Value>,
}

/// Encoder settings per output format, in render order.
///
/// PNG is always present and always first. Other formats follow in the order
/// they were configured; setting a format that is already present replaces
/// its options in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTable(Vec<EncodeOptions>);

impl FormatTable {
    /// A table holding only the built-in PNG settings.
    pub fn png_only() -> Self {
        Self(vec![EncodeOptions::defaults_for(OutputFormat::Png)])
    }

    pub fn set(&mut self, options: EncodeOptions) {
        match self.0.iter_mut().find(|o| o.format() == options.format()) {
            Some(slot) => *slot = options,
            None => self.0.push(options),
        }
    }

    pub fn get(&self, format: OutputFormat) -> Option<&EncodeOptions> {
        self.0.iter().find(|o| o.format() == format)
    }

    pub fn contains(&self, format: OutputFormat) -> bool {
        self.get(format).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncodeOptions> {
        self.0.iter()
    }

    pub fn formats(&self) -> impl Iterator<Item = OutputFormat> {
        self.0.iter().map(EncodeOptions::format)
    }
}

impl Default for FormatTable {
    fn default() -> Self {
        Self::png_only()
    }
}

/// Icon generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct IconOptions {
    /// Absolute or `resolve_dir`-relative path of the source icon.
    pub base_icon: PathBuf,
    /// File stem of the source icon, used to name the default icons.
    pub base_icon_name: String,
    /// Ascending and unique, always containing 192 and 512.
    pub sizes: Vec<u32>,
    pub formats: FormatTable,
    pub resize: ResizeFit,
    pub apple_touch_icon_background: Rgba<u8>,
    pub apple_touch_icon_padding: u32,
    pub favicons: bool,
    pub ms_tile_color: String,
}

impl IconOptions {
    /// PNG settings shared by favicons, tiles and the Apple touch icon.
    pub fn png(&self) -> PngOptions {
        match self.formats.get(OutputFormat::Png) {
            Some(EncodeOptions::Png(png)) => *png,
            _ => PngOptions::default(),
        }
    }

    pub fn apple_touch(&self) -> AppleTouchConfig {
        AppleTouchConfig {
            padding: self.apple_touch_icon_padding,
            background: self.apple_touch_icon_background,
            fit: self.resize,
            png: self.png(),
        }
    }
}

// =============================================================================
// Option loading
// =============================================================================

/// Read an options bag from a `.json`, `.toml` or `package.json` file.
pub fn load_options(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    let value: Value = if is_toml {
        let parsed: toml::Value = toml::from_str(&content)?;
        serde_json::to_value(parsed)?
    } else {
        serde_json::from_str(&content)?
    };

    if is_package_json(path) {
        return match value {
            Value::Object(mut package) => package.remove(PACKAGE_JSON_KEY).ok_or_else(|| {
                ConfigError::missing(
                    PACKAGE_JSON_KEY,
                    format!(
                        "No \"{PACKAGE_JSON_KEY}\" key was found in {}.",
                        path.display()
                    ),
                )
            }),
            _ => Err(ConfigError::invalid(
                PACKAGE_JSON_KEY,
                format!("{} is not a JSON object.", path.display()),
            )),
        };
    }
    Ok(value)
}

/// Extract the fallback-defaults object from a `package.json`.
///
/// Only `name` and `description` are taken; the rest of the package
/// metadata has no bearing on the manifest.
pub fn package_fallback(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let content = fs::read_to_string(path)?;
    let package: Value = serde_json::from_str(&content)?;
    let mut fallback = Map::new();
    for key in ["name", "description"] {
        if let Some(value) = package.get(key).filter(|v| v.is_string()) {
            fallback.insert(key.to_string(), value.clone());
        }
    }
    Ok(fallback)
}

fn is_package_json(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == "package.json")
}

/// Returns a fully-commented stock options file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_options_toml() -> &'static str {
    r##"# PWA Manifest Options
# ====================
# Only `name` and `icons.baseIcon` are required. Everything else is optional;
# values shown below are the defaults. Most keys also accept kebab-case,
# snake_case and a few abbreviated spellings.

# Application name, shown on install prompts and splash screens.
name = "My App"

# Name used where space is limited. Defaults to `name`.
# shortName = "App"

# Manifest description. Omitted from the manifest when empty.
description = ""

# Navigation. Both default to the base URL (`--base-url`, "/" by default).
# startURL = "/"
# scope = "/"

# Browser UI color. Also the default for `backgroundColor`, the Microsoft
# tile color and the Apple touch icon background.
themeColor = "white"

# Cache-busting for generated file names: "name" (hash of the file name),
# "content" (hash of the encoded bytes) or "none".
hashMethod = "name"

# Skip generation entirely. Options are still validated.
disabled = false

# ---------------------------------------------------------------------------
# Well-known manifest fields (validated)
# ---------------------------------------------------------------------------
display = "standalone"   # standalone | minimal-ui | fullscreen | browser
# backgroundColor = "white"
# dir = "auto"           # ltr | rtl | auto
# lang = "en-US"
# orientation = "any"    # any | natural | landscape | portrait (+ -primary / -secondary)
# categories = ["productivity"]
# iarcRatingId = "e84b072d-71b3-4d3e-86ae-31a8ce4e53b7"
# preferRelatedApplications = false
# relatedApplications = [{ platform = "play", url = "https://play.google.com/store/apps/details?id=com.example.app" }]
# screenshots = [{ src = "screenshot.png", sizes = "1280x720", type = "image/png" }]
# serviceworker = { src = "/sw.js" }

# Copy any other top-level key into the manifest verbatim, unvalidated.
# include = ["share_target"]

# ---------------------------------------------------------------------------
# Per-environment overrides
# ---------------------------------------------------------------------------
# Keys here replace top-level keys when `--env production` (or BUILD_ENV) is set.
# [production]
# startURL = "/app/"

# ---------------------------------------------------------------------------
# Icon generation
# ---------------------------------------------------------------------------
[icons]
# Source image, relative to `--resolve-dir`. Should be square and at least
# 512px; SVG is not supported.
baseIcon = "icon.png"

# Square sizes for the manifest icons. 192 and 512 are always added.
sizes = [96, 152, 192, 384, 512]

# cover | contain | fill
resizeMethod = "cover"

# Also generate favicon-32x32.png and favicon-16x16.png.
genFavicons = false

# Apple touch icon (180x180): transparent padding around the artwork, then
# flattened onto this color. Defaults to `themeColor`.
appleTouchIconPadding = 12
# appleTouchIconBG = "white"

# Tile color for browserconfig.xml. Defaults to `themeColor`.
# msTileColor = "white"

# Output formats for the manifest icons. PNG is always generated; listing a
# format replaces its built-in settings.
[icons.formats.png]
compressionLevel = 9

[icons.formats.webp]
quality = 60
reductionEffort = 6
"##
}
