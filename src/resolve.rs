//! Options-bag resolution.
//!
//! Turns the permissive raw options into a validated [`Configuration`]. Every
//! logical option is described by a [`Field`]: the list of spellings it may be
//! supplied under, canonical spelling first. A single lookup walks those
//! spellings in order, then consults the fallback-defaults object, then gives
//! up and lets the caller apply a hard default.
//!
//! ## Resolution Order
//!
//! 1. **Environment overlay**: if [`Meta::environment`] names a top-level key
//!    (case-insensitively), that object's entries replace the top-level ones
//!    and the key itself is dropped.
//! 2. **Identity / navigation / presentation**: `name` (required), `shortName`,
//!    `description`, `startURL`, `scope`, `themeColor`, `hashMethod`.
//! 3. **Icon options**: the required `icons` object with `baseIcon`
//!    (required, must exist on disk), `sizes`, `formats`, `resizeMethod`,
//!    Apple touch and Microsoft tile settings.
//! 4. **Extra manifest fields**: the [`EXTRA_PARAMS`] table validates a closed
//!    set of well-known manifest members.
//! 5. **`include`**: named top-level keys are copied into the manifest verbatim.
//!
//! The first violation aborts with a [`ConfigError`] naming the canonical
//! field. JSON `null` counts as absent everywhere.

use crate::config::{ConfigError, Configuration, FormatTable, IconOptions, Meta};
use crate::fingerprint::HashMethod;
use crate::imaging::calculations::{apple_touch_artwork_size, normalize_sizes};
use crate::imaging::{EncodeOptions, OutputFormat, ResizeFit, parse_css_color};
use serde_json::{Map, Value};
use tracing::debug;

type Result<T> = std::result::Result<T, ConfigError>;

/// One logical option and every spelling it is accepted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub aliases: &'static [&'static str],
}

impl Field {
    pub const fn new(aliases: &'static [&'static str]) -> Self {
        Self { aliases }
    }

    /// The spelling used in error messages and manifest keys.
    pub fn canonical(&self) -> &'static str {
        self.aliases[0]
    }
}

pub const DISABLED: Field = Field::new(&["disabled", "disable"]);
pub const NAME: Field = Field::new(&["name", "appName", "app-name"]);
pub const SHORT_NAME: Field = Field::new(&[
    "shortName",
    "short-name",
    "short_name",
    "appShortName",
    "app-short-name",
]);
pub const DESCRIPTION: Field = Field::new(&["description", "desc"]);
pub const START_URL: Field = Field::new(&["startURL", "startUrl", "start-url", "start_url"]);
pub const SCOPE: Field = Field::new(&["scope"]);
pub const THEME_COLOR: Field = Field::new(&["themeColor", "theme-color", "theme_color", "theme"]);
pub const HASH_METHOD: Field = Field::new(&["hashMethod", "hash-method", "hash_method", "naming"]);
pub const INCLUDE: Field = Field::new(&["include", "includeParams", "include-params"]);
pub const ICONS: Field = Field::new(&[
    "icons",
    "genIcon",
    "gen-icon",
    "iconGen",
    "icon-gen",
    "genIconOpts",
    "gen-icon-opts",
    "iconGenOpts",
    "icon-gen-opts",
    "generateIconOptions",
    "generate-icon-options",
    "iconGenerationOptions",
    "icon-generation-options",
]);

pub const MS_TILE_COLOR: Field = Field::new(&[
    "msTileColor",
    "ms-tile-color",
    "microsoftTileColor",
    "microsoft-tile-color",
]);
pub const BASE_ICON: Field = Field::new(&["baseIcon", "base-icon", "fromIcon", "from-icon"]);
pub const SIZES: Field = Field::new(&["sizes", "sizeList", "size-list"]);
pub const FORMATS: Field = Field::new(&["formats", "formatList", "format-list"]);
pub const RESIZE_METHOD: Field = Field::new(&["resizeMethod", "resize-method", "resize"]);
pub const APPLE_TOUCH_ICON_BG: Field = Field::new(&[
    "appleTouchIconBG",
    "appleTouchIconBg",
    "apple-touch-icon-bg",
    "appleTouchIconBackground",
    "apple-touch-icon-background",
    "atib",
]);
pub const APPLE_TOUCH_ICON_PADDING: Field = Field::new(&[
    "appleTouchIconPadding",
    "apple-touch-icon-padding",
    "atip",
]);
pub const GEN_FAVICONS: Field = Field::new(&[
    "genFavicons",
    "gen-favicons",
    "generateFavicons",
    "generate-favicons",
]);

// =============================================================================
// Extra manifest parameters
// =============================================================================

/// Shape check for a well-known manifest member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    String,
    Bool,
    OneOf(&'static [&'static str]),
    StringList,
    /// Array of objects, each with a non-empty value under the key.
    ObjectsWith(&'static str),
    /// Object carrying the key.
    ObjectWith(&'static str),
}

impl Check {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Check::String => value.is_string(),
            Check::Bool => value.is_boolean(),
            Check::OneOf(allowed) => value
                .as_str()
                .is_some_and(|s| allowed.iter().any(|a| *a == s)),
            Check::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Check::ObjectsWith(key) => value.as_array().is_some_and(|items| {
                items
                    .iter()
                    .all(|item| item.get(key).is_some_and(is_truthy))
            }),
            Check::ObjectWith(key) => value.as_object().is_some_and(|obj| obj.contains_key(*key)),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Default applied when a well-known member is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraDefault {
    ThemeColor,
    Text(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct ExtraParam {
    pub field: Field,
    pub check: Check,
    pub default: Option<ExtraDefault>,
}

/// Well-known manifest members, in manifest order. The canonical spelling is
/// the manifest key.
pub const EXTRA_PARAMS: &[ExtraParam] = &[
    ExtraParam {
        field: Field::new(&[
            "background_color",
            "backgroundColor",
            "background-color",
            "bgColor",
            "bg-color",
            "bg",
        ]),
        check: Check::String,
        default: Some(ExtraDefault::ThemeColor),
    },
    ExtraParam {
        field: Field::new(&["categories"]),
        check: Check::StringList,
        default: None,
    },
    ExtraParam {
        field: Field::new(&["dir", "direction", "textDirection", "text-direction"]),
        check: Check::OneOf(&["rtl", "ltr", "auto"]),
        default: None,
    },
    ExtraParam {
        field: Field::new(&["display", "displayMode", "display-mode"]),
        check: Check::OneOf(&["standalone", "minimal-ui", "fullscreen", "browser"]),
        default: Some(ExtraDefault::Text("standalone")),
    },
    ExtraParam {
        field: Field::new(&[
            "iarc_rating_id",
            "iarc",
            "iarcId",
            "iarcID",
            "iarc-id",
            "iarcRatingId",
            "iarcRatingID",
            "iarc-rating-id",
            "iarcRating",
            "iarc-rating",
        ]),
        check: Check::String,
        default: None,
    },
    ExtraParam {
        field: Field::new(&["lang", "language"]),
        check: Check::String,
        default: None,
    },
    ExtraParam {
        field: Field::new(&["orientation", "rotated", "screenOrientation", "screen-orientation"]),
        check: Check::OneOf(&[
            "any",
            "natural",
            "landscape",
            "landscape-primary",
            "landscape-secondary",
            "portrait",
            "portrait-primary",
            "portrait-secondary",
        ]),
        default: None,
    },
    ExtraParam {
        field: Field::new(&[
            "prefer_related_applications",
            "preferRelated",
            "prefer-related",
            "preferRelatedApplications",
            "prefer-related-applications",
        ]),
        check: Check::Bool,
        default: None,
    },
    ExtraParam {
        field: Field::new(&[
            "related_applications",
            "related",
            "relatedApplications",
            "related-applications",
        ]),
        check: Check::ObjectsWith("url"),
        default: None,
    },
    ExtraParam {
        field: Field::new(&["screenshots", "screenShots", "screen-shots"]),
        check: Check::ObjectsWith("src"),
        default: None,
    },
    ExtraParam {
        field: Field::new(&["serviceworker", "sw", "serviceWorker", "service-worker"]),
        check: Check::ObjectWith("src"),
        default: None,
    },
];

// =============================================================================
// Lookup
// =============================================================================

/// An options object plus the fallback-defaults object behind it.
struct Source<'a> {
    opts: &'a Map<String, Value>,
    fallback: &'a Map<String, Value>,
}

fn first_present<'a>(map: &'a Map<String, Value>, field: &Field) -> Option<&'a Value> {
    field
        .aliases
        .iter()
        .find_map(|alias| map.get(*alias).filter(|v| !v.is_null()))
}

impl<'a> Source<'a> {
    fn lookup(&self, field: &Field) -> Option<&'a Value> {
        first_present(self.opts, field).or_else(|| first_present(self.fallback, field))
    }

    fn string(&self, field: &Field, message: &str) -> Result<Option<String>> {
        match self.lookup(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ConfigError::invalid(field.canonical(), message)),
        }
    }

    fn boolean(&self, field: &Field, message: &str) -> Result<Option<bool>> {
        match self.lookup(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(ConfigError::invalid(field.canonical(), message)),
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Merge the environment-specific override object over the top level.
///
/// Returns the options unchanged when no environment is set or no key
/// matches it.
pub fn apply_environment(
    opts: &Map<String, Value>,
    environment: Option<&str>,
) -> Result<Map<String, Value>> {
    let Some(env) = environment.filter(|e| !e.is_empty()) else {
        return Ok(opts.clone());
    };
    let Some((key, overlay)) = opts
        .iter()
        .find(|(key, value)| key.eq_ignore_ascii_case(env) && !value.is_null())
    else {
        return Ok(opts.clone());
    };
    let Value::Object(overlay) = overlay else {
        return Err(ConfigError::invalid(
            key,
            format!(
                "The specific options for environment \"{env}\" must be an object containing the desired parameters."
            ),
        ));
    };

    let mut merged: Map<String, Value> = opts
        .iter()
        .filter(|(k, _)| *k != key)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (k, v) in overlay {
        merged.insert(k.clone(), v.clone());
    }
    debug!(environment = env, overrides = overlay.len(), "applied environment options");
    Ok(merged)
}

/// Resolve the raw options bag into a [`Configuration`].
pub fn resolve(raw: &Value, meta: &Meta, fallback: &Map<String, Value>) -> Result<Configuration> {
    let Value::Object(raw) = raw else {
        return Err(ConfigError::invalid(
            "options",
            "The PWA Manifest options must be an object containing the desired parameters.",
        ));
    };
    let opts = apply_environment(raw, meta.environment.as_deref())?;
    let top = Source {
        opts: &opts,
        fallback,
    };

    let disabled = top
        .boolean(
            &DISABLED,
            "The disable option in the PWA manifest options must be a boolean.",
        )?
        .unwrap_or(false);

    let name = match top.lookup(&NAME) {
        None => {
            return Err(ConfigError::missing(
                NAME.canonical(),
                "No name was found in the options.",
            ));
        }
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(ConfigError::invalid(
                NAME.canonical(),
                "The name provided in the options must be a string.",
            ));
        }
    };
    let short_name = top
        .string(
            &SHORT_NAME,
            "The short name provided in the options must be a string.",
        )?
        .unwrap_or_else(|| name.clone());
    let description = top
        .string(
            &DESCRIPTION,
            "The description provided in the options must be a string.",
        )?
        .unwrap_or_default();
    let start_url = top
        .string(
            &START_URL,
            "The start URL provided in the options must be a string.",
        )?
        .unwrap_or_else(|| meta.base_url.clone());
    let scope = top
        .string(&SCOPE, "The scope provided in the options must be a string.")?
        .unwrap_or_else(|| meta.base_url.clone());
    let theme_color = top
        .string(
            &THEME_COLOR,
            "The theme color provided in the options must be a string representing a valid CSS color.",
        )?
        .unwrap_or_else(|| "white".to_string());
    let naming = resolve_hash_method(&top)?;

    let icons = resolve_icons(&top, meta, &theme_color)?;

    let mut extra_params = resolve_extra_params(&opts, &theme_color)?;
    apply_include(&top, &opts, &mut extra_params)?;

    Ok(Configuration {
        disabled,
        name,
        short_name,
        description,
        start_url,
        scope,
        theme_color,
        base_url: meta.base_url.clone(),
        naming,
        icons,
        extra_params,
    })
}

fn resolve_hash_method(top: &Source<'_>) -> Result<HashMethod> {
    let message = "The hash method in the options must be one of 'name', 'content', or 'none'.";
    match top.string(&HASH_METHOD, message)? {
        None => Ok(HashMethod::default()),
        Some(name) => HashMethod::from_name(&name)
            .ok_or_else(|| ConfigError::invalid(HASH_METHOD.canonical(), message)),
    }
}

fn resolve_icons(top: &Source<'_>, meta: &Meta, theme_color: &str) -> Result<IconOptions> {
    let icon_opts = match top.lookup(&ICONS) {
        None => {
            return Err(ConfigError::missing(
                ICONS.canonical(),
                "No icon generation options found in the PWA manifest options.",
            ));
        }
        Some(Value::Object(obj)) => obj,
        Some(_) => {
            return Err(ConfigError::invalid(
                ICONS.canonical(),
                "The icon generation options in the PWA manifest options must be an object containing the desired parameters.",
            ));
        }
    };
    let icons = Source {
        opts: icon_opts,
        fallback: top.fallback,
    };

    let ms_tile_color = icons
        .string(
            &MS_TILE_COLOR,
            "The Microsoft tile color provided in the options must be a string representing the theme color for the application.",
        )?
        .unwrap_or_else(|| theme_color.to_string());

    let base_icon_path = match icons.lookup(&BASE_ICON) {
        None => {
            return Err(ConfigError::missing(
                BASE_ICON.canonical(),
                "No base icon was found in the icon generation options.",
            ));
        }
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(ConfigError::invalid(
                BASE_ICON.canonical(),
                "The base icon parameter in the icon generation options must be a string that contains the path to the icon.",
            ));
        }
    };
    let base_icon = meta.resolve_dir.join(&base_icon_path);
    if !base_icon.is_file() {
        return Err(ConfigError::invalid(
            BASE_ICON.canonical(),
            format!("No icon was found at the base icon path {base_icon_path}."),
        ));
    }
    let base_icon_name = base_icon
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let sizes = resolve_sizes(icons.lookup(&SIZES))?;
    let formats = resolve_formats(icons.lookup(&FORMATS))?;

    let resize_message =
        "The resize method parameter in the icon generation options must be one of 'cover', 'contain', or 'fill'.";
    let resize = match icons.string(&RESIZE_METHOD, resize_message)? {
        None => ResizeFit::default(),
        Some(name) => ResizeFit::from_name(&name)
            .ok_or_else(|| ConfigError::invalid(RESIZE_METHOD.canonical(), resize_message))?,
    };

    let background_message =
        "The Apple Touch Icon background color parameter must be a string representing a valid CSS color.";
    let apple_touch_icon_background = match icons.string(&APPLE_TOUCH_ICON_BG, background_message)? {
        Some(background) => parse_css_color(&background)
            .map_err(|_| ConfigError::invalid(APPLE_TOUCH_ICON_BG.canonical(), background_message))?,
        // Inherited from the theme color, so the theme color is what to fix.
        None => parse_css_color(theme_color).map_err(|_| {
            ConfigError::invalid(
                THEME_COLOR.canonical(),
                "The theme color parameter must be a valid CSS color when no Apple Touch Icon background color is given.",
            )
        })?,
    };

    let apple_touch_icon_padding = match icons.lookup(&APPLE_TOUCH_ICON_PADDING) {
        None => 12,
        Some(value) => value
            .as_u64()
            .and_then(|p| u32::try_from(p).ok())
            .filter(|&p| apple_touch_artwork_size(p).is_some())
            .ok_or_else(|| {
                ConfigError::invalid(
                    APPLE_TOUCH_ICON_PADDING.canonical(),
                    "The Apple Touch Icon padding parameter must be a number of pixels to pad the image with on each side, from 0 to 89.",
                )
            })?,
    };

    let favicons = icons
        .boolean(
            &GEN_FAVICONS,
            "The favicon generation option in the icon generation options must be a boolean.",
        )?
        .unwrap_or(false);

    Ok(IconOptions {
        base_icon,
        base_icon_name,
        sizes,
        formats,
        resize,
        apple_touch_icon_background,
        apple_touch_icon_padding,
        favicons,
        ms_tile_color,
    })
}

const DEFAULT_SIZES: [u32; 5] = [96, 152, 192, 384, 512];

fn resolve_sizes(value: Option<&Value>) -> Result<Vec<u32>> {
    let Some(value) = value else {
        return Ok(normalize_sizes(&DEFAULT_SIZES));
    };
    let invalid = || {
        ConfigError::invalid(
            SIZES.canonical(),
            "The sizes parameter in the icon generation options must be an array of numeric pixel values for sizes of the images.",
        )
    };
    let items = value.as_array().ok_or_else(invalid)?;
    let sizes = items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|&n| n > 0)
                .ok_or_else(invalid)
        })
        .collect::<Result<Vec<u32>>>()?;
    Ok(normalize_sizes(&sizes))
}

fn resolve_formats(value: Option<&Value>) -> Result<FormatTable> {
    let mut formats = FormatTable::png_only();
    let Some(value) = value else {
        formats.set(EncodeOptions::defaults_for(OutputFormat::Webp));
        return Ok(formats);
    };

    let invalid = |detail: String| {
        ConfigError::invalid(
            FORMATS.canonical(),
            format!(
                "The formats parameter in the icon generation options must be an object with each key being a supported file type (png, webp, jpeg, or tiff) for the output images, and each value being the encoder options. {detail}"
            ),
        )
    };
    let entries = value
        .as_object()
        .ok_or_else(|| invalid("Got a non-object value.".to_string()))?;
    for (name, options) in entries {
        let format = OutputFormat::from_name(name)
            .ok_or_else(|| invalid(format!("\"{name}\" is not supported.")))?;
        let options = match options {
            Value::Null => EncodeOptions::defaults_for(format),
            Value::Object(_) => EncodeOptions::from_value(format, options)
                .map_err(|e| invalid(format!("Bad \"{name}\" options: {e}.")))?,
            _ => return Err(invalid(format!("The \"{name}\" options must be an object."))),
        };
        formats.set(options);
    }
    Ok(formats)
}

fn resolve_extra_params(opts: &Map<String, Value>, theme_color: &str) -> Result<Map<String, Value>> {
    let mut extras = Map::new();
    for param in EXTRA_PARAMS {
        let key = param.field.canonical();
        match first_present(opts, &param.field) {
            Some(value) if param.check.accepts(value) => {
                extras.insert(key.to_string(), value.clone());
            }
            Some(_) => {
                return Err(ConfigError::invalid(
                    key,
                    format!(
                        "Parameter \"{key}\" provided in the options is invalid. Please check the official MDN documentation on the Web App Manifest."
                    ),
                ));
            }
            None => match param.default {
                Some(ExtraDefault::ThemeColor) => {
                    extras.insert(key.to_string(), Value::String(theme_color.to_string()));
                }
                Some(ExtraDefault::Text(text)) => {
                    extras.insert(key.to_string(), Value::String(text.to_string()));
                }
                None => {}
            },
        }
    }
    Ok(extras)
}

fn apply_include(
    top: &Source<'_>,
    opts: &Map<String, Value>,
    extras: &mut Map<String, Value>,
) -> Result<()> {
    let Some(include) = top.lookup(&INCLUDE) else {
        return Ok(());
    };
    let names = include
        .as_array()
        .filter(|items| items.iter().all(Value::is_string))
        .ok_or_else(|| {
            ConfigError::invalid(
                INCLUDE.canonical(),
                "The include parameter in the options must be an array of extra parameter names to include in the final manifest.",
            )
        })?;
    for name in names.iter().filter_map(Value::as_str) {
        if let Some(value) = opts.get(name).filter(|v| !v.is_null()) {
            extras.insert(name.to_string(), value.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{PngOptions, Quality, WebpOptions};
    use crate::test_helpers::{icon_dir, meta_for};
    use image::Rgba;
    use serde_json::json;

    fn no_fallback() -> Map<String, Value> {
        Map::new()
    }

    fn resolve_ok(raw: Value) -> Configuration {
        let dir = icon_dir();
        resolve(&raw, &meta_for(&dir), &no_fallback()).unwrap()
    }

    fn resolve_err(raw: Value) -> ConfigError {
        let dir = icon_dir();
        resolve(&raw, &meta_for(&dir), &no_fallback()).unwrap_err()
    }

    fn minimal() -> Value {
        json!({"name": "My App", "icons": {"baseIcon": "icon.png"}})
    }

    // =========================================================================
    // Identity and defaults
    // =========================================================================

    #[test]
    fn minimal_options_get_defaults() {
        let config = resolve_ok(minimal());

        assert!(!config.disabled);
        assert_eq!(config.name, "My App");
        assert_eq!(config.short_name, "My App");
        assert_eq!(config.description, "");
        assert_eq!(config.start_url, "/");
        assert_eq!(config.scope, "/");
        assert_eq!(config.theme_color, "white");
        assert_eq!(config.naming, HashMethod::Name);
        assert_eq!(config.icons.base_icon_name, "icon");
        assert_eq!(config.icons.sizes, vec![96, 152, 192, 384, 512]);
        assert_eq!(config.icons.resize, ResizeFit::Cover);
        assert_eq!(config.icons.apple_touch_icon_padding, 12);
        assert_eq!(config.icons.apple_touch_icon_background, Rgba([255, 255, 255, 255]));
        assert_eq!(config.icons.ms_tile_color, "white");
        assert!(!config.icons.favicons);
    }

    #[test]
    fn missing_name_differs_from_wrong_type() {
        let missing = resolve_err(json!({"icons": {"baseIcon": "icon.png"}}));
        assert!(matches!(missing, ConfigError::Missing { .. }));
        assert_eq!(missing.to_string(), "No name was found in the options.");

        let wrong = resolve_err(json!({"name": 4, "icons": {"baseIcon": "icon.png"}}));
        assert!(matches!(wrong, ConfigError::Invalid { .. }));
        assert_eq!(wrong.field(), Some("name"));
    }

    #[test]
    fn aliases_resolve_in_priority_order() {
        let config = resolve_ok(json!({
            "app-name": "Aliased",
            "short_name": "Short",
            "app-short-name": "Ignored",
            "desc": "About",
            "start_url": "/start",
            "theme": "#123456",
            "genIcon": {"from-icon": "icon.png", "size-list": [64]}
        }));

        assert_eq!(config.name, "Aliased");
        assert_eq!(config.short_name, "Short");
        assert_eq!(config.description, "About");
        assert_eq!(config.start_url, "/start");
        assert_eq!(config.theme_color, "#123456");
        assert_eq!(config.icons.sizes, vec![64, 192, 512]);
    }

    #[test]
    fn earlier_alias_wins_over_later() {
        let config = resolve_ok(json!({
            "name": "First",
            "appName": "Second",
            "icons": {"baseIcon": "icon.png"}
        }));
        assert_eq!(config.name, "First");
    }

    #[test]
    fn null_counts_as_absent() {
        let config = resolve_ok(json!({
            "name": "App",
            "shortName": null,
            "short_name": "Short",
            "icons": {"baseIcon": "icon.png", "sizes": null}
        }));
        assert_eq!(config.short_name, "Short");
        assert_eq!(config.icons.sizes, vec![96, 152, 192, 384, 512]);
    }

    #[test]
    fn fallback_fills_missing_fields() {
        let dir = icon_dir();
        let fallback = json!({"name": "pkg-name", "description": "From package"});
        let config = resolve(
            &json!({"icons": {"baseIcon": "icon.png"}}),
            &meta_for(&dir),
            fallback.as_object().unwrap(),
        )
        .unwrap();

        assert_eq!(config.name, "pkg-name");
        assert_eq!(config.short_name, "pkg-name");
        assert_eq!(config.description, "From package");
    }

    #[test]
    fn options_override_fallback() {
        let dir = icon_dir();
        let fallback = json!({"name": "pkg-name"});
        let config = resolve(&minimal(), &meta_for(&dir), fallback.as_object().unwrap()).unwrap();
        assert_eq!(config.name, "My App");
    }

    #[test]
    fn navigation_defaults_follow_base_url() {
        let dir = icon_dir();
        let meta = Meta {
            base_url: "/app/".to_string(),
            ..meta_for(&dir)
        };
        let config = resolve(&minimal(), &meta, &no_fallback()).unwrap();
        assert_eq!(config.start_url, "/app/");
        assert_eq!(config.scope, "/app/");
        assert_eq!(config.base_url, "/app/");
    }

    #[test]
    fn non_object_options_rejected() {
        assert!(matches!(
            resolve_err(json!("nope")),
            ConfigError::Invalid { .. }
        ));
    }

    #[test]
    fn disabled_must_be_boolean() {
        let mut raw = minimal();
        raw["disabled"] = json!("yes");
        assert_eq!(resolve_err(raw).field(), Some("disabled"));

        let mut raw = minimal();
        raw["disable"] = json!(true);
        assert!(resolve_ok(raw).disabled);
    }

    #[test]
    fn hash_method_option() {
        let mut raw = minimal();
        raw["naming"] = json!("content");
        assert_eq!(resolve_ok(raw).naming, HashMethod::Content);

        let mut raw = minimal();
        raw["hashMethod"] = json!("md5");
        assert_eq!(resolve_err(raw).field(), Some("hashMethod"));
    }

    // =========================================================================
    // Environment overlay
    // =========================================================================

    #[test]
    fn environment_overlay_replaces_top_level() {
        let dir = icon_dir();
        let raw = json!({
            "name": "Dev App",
            "icons": {"baseIcon": "icon.png"},
            "production": {"name": "Prod App", "startURL": "/prod/"}
        });
        let meta = Meta {
            environment: Some("PRODUCTION".to_string()),
            ..meta_for(&dir)
        };

        let config = resolve(&raw, &meta, &no_fallback()).unwrap();

        assert_eq!(config.name, "Prod App");
        assert_eq!(config.start_url, "/prod/");
        assert!(!config.extra_params.contains_key("production"));
    }

    #[test]
    fn environment_without_matching_key_is_ignored() {
        let opts = json!({"name": "App"});
        let merged = apply_environment(opts.as_object().unwrap(), Some("staging")).unwrap();
        assert_eq!(merged, *opts.as_object().unwrap());
    }

    #[test]
    fn environment_key_must_be_object() {
        let opts = json!({"name": "App", "production": "yes"});
        let err = apply_environment(opts.as_object().unwrap(), Some("production")).unwrap_err();
        assert!(err.to_string().contains("\"production\""));
    }

    #[test]
    fn environment_key_dropped_from_merged_options() {
        let opts = json!({"a": 1, "Production": {"b": 2}, "c": 3});
        let merged = apply_environment(opts.as_object().unwrap(), Some("production")).unwrap();
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c", "b"]);
    }

    // =========================================================================
    // Icon options
    // =========================================================================

    #[test]
    fn icon_options_required() {
        let err = resolve_err(json!({"name": "App"}));
        assert!(matches!(err, ConfigError::Missing { .. }));
        assert_eq!(err.field(), Some("icons"));

        let err = resolve_err(json!({"name": "App", "icons": []}));
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn base_icon_required_and_must_exist() {
        let err = resolve_err(json!({"name": "App", "icons": {}}));
        assert!(matches!(err, ConfigError::Missing { .. }));
        assert_eq!(err.field(), Some("baseIcon"));

        let err = resolve_err(json!({"name": "App", "icons": {"baseIcon": "missing.png"}}));
        assert_eq!(
            err.to_string(),
            "No icon was found at the base icon path missing.png."
        );
    }

    #[test]
    fn sizes_always_include_required_sizes() {
        let mut raw = minimal();
        raw["icons"]["sizes"] = json!([48, 192]);
        assert_eq!(resolve_ok(raw).icons.sizes, vec![48, 192, 512]);
    }

    #[test]
    fn sizes_must_be_positive_integers() {
        for bad in [json!("96"), json!([96, "x"]), json!([0]), json!([-5]), json!([1.5])] {
            let mut raw = minimal();
            raw["icons"]["sizes"] = bad;
            assert_eq!(resolve_err(raw).field(), Some("sizes"));
        }
    }

    #[test]
    fn default_formats_are_png_and_webp() {
        let config = resolve_ok(minimal());
        let formats: Vec<OutputFormat> = config.icons.formats.formats().collect();
        assert_eq!(formats, vec![OutputFormat::Png, OutputFormat::Webp]);
    }

    #[test]
    fn user_formats_follow_configured_order_after_png() {
        let mut raw = minimal();
        raw["icons"]["formats"] = json!({"jpeg": {}, "webp": {}});
        let formats: Vec<OutputFormat> = resolve_ok(raw).icons.formats.formats().collect();
        assert_eq!(
            formats,
            vec![OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::Webp]
        );

        let mut raw = minimal();
        raw["icons"]["formats"] = json!({"tiff": {}, "png": {}, "webp": {}});
        let formats: Vec<OutputFormat> = resolve_ok(raw).icons.formats.formats().collect();
        assert_eq!(
            formats,
            vec![OutputFormat::Png, OutputFormat::Tiff, OutputFormat::Webp]
        );
    }

    #[test]
    fn user_formats_keep_png_defaults() {
        let mut raw = minimal();
        raw["icons"]["formats"] = json!({"webp": {"quality": 10}});

        let formats = resolve_ok(raw).icons.formats;

        assert_eq!(formats.len(), 2);
        assert_eq!(
            formats.get(OutputFormat::Png),
            Some(&EncodeOptions::Png(PngOptions::default()))
        );
        assert_eq!(
            formats.get(OutputFormat::Webp),
            Some(&EncodeOptions::Webp(WebpOptions {
                quality: Quality::new(10),
                ..WebpOptions::default()
            }))
        );
        assert!(!formats.contains(OutputFormat::Jpeg));
        assert!(!formats.contains(OutputFormat::Tiff));
    }

    #[test]
    fn user_png_options_replace_defaults() {
        let mut raw = minimal();
        raw["icons"]["formats"] = json!({"png": {"compressionLevel": 2}});

        let formats = resolve_ok(raw).icons.formats;
        assert_eq!(formats.len(), 1);
        assert_eq!(
            formats.get(OutputFormat::Png),
            Some(&EncodeOptions::Png(PngOptions {
                compression_level: 2,
                ..PngOptions::default()
            }))
        );
    }

    #[test]
    fn unsupported_format_rejected() {
        let mut raw = minimal();
        raw["icons"]["formats"] = json!({"gif": {}});
        assert_eq!(resolve_err(raw).field(), Some("formats"));

        let mut raw = minimal();
        raw["icons"]["formats"] = json!(["png"]);
        assert_eq!(resolve_err(raw).field(), Some("formats"));
    }

    #[test]
    fn resize_method_enum() {
        let mut raw = minimal();
        raw["icons"]["resize"] = json!("contain");
        assert_eq!(resolve_ok(raw).icons.resize, ResizeFit::Contain);

        let mut raw = minimal();
        raw["icons"]["resizeMethod"] = json!("inside");
        assert_eq!(resolve_err(raw).field(), Some("resizeMethod"));
    }

    #[test]
    fn apple_touch_settings() {
        let mut raw = minimal();
        raw["themeColor"] = json!("#000000");
        raw["icons"]["atip"] = json!(0);
        let config = resolve_ok(raw);
        assert_eq!(config.icons.apple_touch_icon_padding, 0);
        assert_eq!(config.icons.apple_touch_icon_background, Rgba([0, 0, 0, 255]));

        let mut raw = minimal();
        raw["icons"]["atib"] = json!("red");
        assert_eq!(
            resolve_ok(raw).icons.apple_touch_icon_background,
            Rgba([255, 0, 0, 255])
        );
    }

    #[test]
    fn apple_touch_padding_bounds() {
        for bad in [json!(90), json!(-1), json!(2.5), json!("12")] {
            let mut raw = minimal();
            raw["icons"]["appleTouchIconPadding"] = bad;
            assert_eq!(resolve_err(raw).field(), Some("appleTouchIconPadding"));
        }
        let mut raw = minimal();
        raw["icons"]["appleTouchIconPadding"] = json!(89);
        assert_eq!(resolve_ok(raw).icons.apple_touch_icon_padding, 89);
    }

    #[test]
    fn apple_touch_background_inherits_css4_theme_colors() {
        let cases = [
            ("hsl(120, 100%, 50%)", Rgba([0, 255, 0, 255])),
            ("#336699cc", Rgba([0x33, 0x66, 0x99, 0xcc])),
            ("rgb(0 0 0)", Rgba([0, 0, 0, 255])),
            ("rebeccapurple", Rgba([102, 51, 153, 255])),
        ];
        for (theme, expected) in cases {
            let mut raw = minimal();
            raw["themeColor"] = json!(theme);
            let config = resolve_ok(raw);
            assert_eq!(config.icons.apple_touch_icon_background, expected, "{theme}");
            assert_eq!(config.theme_color, theme);
        }
    }

    #[test]
    fn unparseable_inherited_background_blames_theme_color() {
        let mut raw = minimal();
        raw["themeColor"] = json!("not-a-color");
        assert_eq!(resolve_err(raw).field(), Some("themeColor"));

        let mut raw = minimal();
        raw["themeColor"] = json!("not-a-color");
        raw["icons"]["atib"] = json!("white");
        assert_eq!(resolve_ok(raw).theme_color, "not-a-color");
    }

    #[test]
    fn unparseable_apple_touch_background_rejected() {
        let mut raw = minimal();
        raw["icons"]["appleTouchIconBg"] = json!("not-a-color");
        assert_eq!(resolve_err(raw).field(), Some("appleTouchIconBG"));
    }

    #[test]
    fn ms_tile_color_defaults_to_theme() {
        let mut raw = minimal();
        raw["theme-color"] = json!("#abcdef");
        assert_eq!(resolve_ok(raw).icons.ms_tile_color, "#abcdef");

        let mut raw = minimal();
        raw["icons"]["microsoft-tile-color"] = json!("#010203");
        assert_eq!(resolve_ok(raw).icons.ms_tile_color, "#010203");
    }

    #[test]
    fn favicons_toggle() {
        let mut raw = minimal();
        raw["icons"]["generateFavicons"] = json!(true);
        assert!(resolve_ok(raw).icons.favicons);

        let mut raw = minimal();
        raw["icons"]["genFavicons"] = json!(1);
        assert_eq!(resolve_err(raw).field(), Some("genFavicons"));
    }

    // =========================================================================
    // Extra parameters and include
    // =========================================================================

    #[test]
    fn extra_params_defaults() {
        let mut raw = minimal();
        raw["theme"] = json!("black");
        let extras = resolve_ok(raw).extra_params;
        assert_eq!(extras.len(), 2);
        assert_eq!(extras["background_color"], "black");
        assert_eq!(extras["display"], "standalone");
    }

    #[test]
    fn extra_params_use_canonical_keys() {
        let mut raw = minimal();
        raw["bg"] = json!("#fff");
        raw["displayMode"] = json!("fullscreen");
        raw["language"] = json!("en");
        raw["sw"] = json!({"src": "/sw.js"});
        raw["related"] = json!([{"url": "https://example.com", "platform": "web"}]);
        raw["preferRelated"] = json!(false);

        let extras = resolve_ok(raw).extra_params;

        let keys: Vec<&str> = extras.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "background_color",
                "display",
                "lang",
                "prefer_related_applications",
                "related_applications",
                "serviceworker"
            ]
        );
        assert_eq!(extras["display"], "fullscreen");
        assert_eq!(extras["serviceworker"]["src"], "/sw.js");
    }

    #[test]
    fn invalid_extra_param_rejected() {
        let cases = [
            ("orientation", json!("sideways")),
            ("dir", json!("up")),
            ("categories", json!(["ok", 3])),
            ("screenshots", json!([{"sizes": "1x1"}])),
            ("serviceWorker", json!({"scope": "/"})),
            ("iarc", json!(42)),
        ];
        for (key, value) in cases {
            let mut raw = minimal();
            raw[key] = value;
            let err = resolve_err(raw);
            assert!(
                err.to_string().contains("provided in the options is invalid"),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn include_copies_verbatim() {
        let mut raw = minimal();
        raw["customField"] = json!(42);
        raw["include"] = json!(["customField", "absentField"]);

        let extras = resolve_ok(raw).extra_params;

        assert_eq!(extras["customField"], 42);
        assert!(!extras.contains_key("absentField"));
    }

    #[test]
    fn include_can_override_validated_params() {
        let mut raw = minimal();
        raw["display"] = json!("browser");
        raw["include"] = json!(["display"]);
        assert_eq!(resolve_ok(raw).extra_params["display"], "browser");
    }

    #[test]
    fn include_must_be_string_array() {
        let mut raw = minimal();
        raw["include-params"] = json!("customField");
        assert_eq!(resolve_err(raw).field(), Some("include"));
    }

    #[test]
    fn stock_options_resolve() {
        let stock: toml::Value = toml::from_str(crate::config::stock_options_toml()).unwrap();
        let raw = serde_json::to_value(stock).unwrap();
        let config = resolve_ok(raw);
        assert_eq!(config.name, "My App");
        assert_eq!(config.icons.formats.len(), 2);
        assert_eq!(config.extra_params["display"], "standalone");
    }
}
