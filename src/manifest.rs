//! Manifest document, HTML head fragments, and the browser-config envelope.
//!
//! HTML is rendered with maud, so every interpolated value is escaped. The
//! browser config is XML; its few elements are formatted directly with the
//! same escaping applied to text and attribute values.

use crate::config::Configuration;
use maud::html;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// File name of the manifest, relative to the base URL.
pub const MANIFEST_FILENAME: &str = "manifest.webmanifest";

/// File name of the Microsoft browser config, relative to the base URL.
pub const BROWSER_CONFIG_FILENAME: &str = "browserconfig.xml";

/// One entry of the manifest `icons` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconEntry {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl IconEntry {
    fn to_value(&self) -> Value {
        json!({
            "src": self.src,
            "sizes": self.sizes,
            "type": self.mime_type,
        })
    }
}

/// The final web app manifest, keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ManifestDocument(Map<String, Value>);

impl ManifestDocument {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The `icons` array, as typed entries.
    pub fn icons(&self) -> Vec<IconEntry> {
        self.0
            .get("icons")
            .cloned()
            .and_then(|icons| serde_json::from_value(icons).ok())
            .unwrap_or_default()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }
}

/// Assemble the manifest.
///
/// Extra parameters are merged last and may replace any earlier key.
pub fn build_manifest(config: &Configuration, icons: &[IconEntry]) -> ManifestDocument {
    let mut doc = Map::new();
    doc.insert("name".into(), Value::String(config.name.clone()));
    doc.insert("short_name".into(), Value::String(config.short_name.clone()));
    doc.insert("start_url".into(), Value::String(config.start_url.clone()));
    doc.insert("scope".into(), Value::String(config.scope.clone()));
    if !config.description.is_empty() {
        doc.insert(
            "description".into(),
            Value::String(config.description.clone()),
        );
    }
    doc.insert(
        "icons".into(),
        Value::Array(icons.iter().map(IconEntry::to_value).collect()),
    );
    doc.insert(
        "theme_color".into(),
        Value::String(config.theme_color.clone()),
    );
    for (key, value) in &config.extra_params {
        doc.insert(key.clone(), value.clone());
    }
    ManifestDocument(doc)
}

// =============================================================================
// HTML fragments
// =============================================================================

/// Head tags emitted before any icon is generated.
pub fn initial_head_html(base_url: &str, theme_color: &str) -> String {
    html! {
        meta name="msapplication-config" content=(format!("{base_url}{BROWSER_CONFIG_FILENAME}"));
        meta name="theme-color" content=(theme_color);
    }
    .into_string()
}

/// `<link rel=... sizes=... href=...>` for a generated icon.
pub fn icon_link_html(rel: &str, sizes: &str, href: &str) -> String {
    html! {
        link rel=(rel) sizes=(sizes) href=(href);
    }
    .into_string()
}

pub fn manifest_link_html(base_url: &str) -> String {
    html! {
        link rel="manifest" href=(format!("{base_url}{MANIFEST_FILENAME}"));
    }
    .into_string()
}

// =============================================================================
// Browser config XML
// =============================================================================

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

pub fn tile_color_xml(color: &str) -> String {
    format!("<TileColor>{}</TileColor>", escape(color))
}

/// A logo element such as `<square70x70logo src="..."/>`.
pub fn tile_logo_xml(element: &str, src: &str) -> String {
    format!("<{element} src=\"{}\"/>", escape(src))
}

/// Wrap the accumulated tile body in the browser-config envelope.
pub fn browser_config_xml(tile_body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><browserconfig><msapplication><tile>{tile_body}</tile></msapplication></browserconfig>"
    )
}
