//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! My App (short name: App)
//!     Start URL: /
//!     Scope: /
//!     Theme color: white
//!     Naming: name
//! Icons
//!     Base icon: ./icon.png
//!     Sizes: 96, 152, 192, 384, 512
//!     Formats: png, webp
//!     Resize: cover
//!     Favicons: no
//!     Apple touch icon: padding 12px on #ffffff
//!     Tile color: white
//! Manifest extras
//!     background_color: "white"
//!     display: "standalone"
//! ```
//!
//! ## Generate
//!
//! Progress lines come from a wildcard event listener while the run is in
//! progress; the summary is printed afterwards.
//!
//! ```text
//! ==> Generating icons for My App...
//!     icon-96x96.png (4.1 KB)
//!     icon-96x96.webp (1.9 KB)
//! ==> Generating Apple Touch Icon...
//!     apple-touch-icon.png (12.0 KB)
//!
//! Files
//!     apple-touch-icon.7f3a2c1b.png (12.0 KB)
//!     ...
//! Generated 15 assets → dist
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>` or a line) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::Configuration;
use crate::events::Payload;
use crate::pipeline::Generation;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count: `512 B`, `4.1 KB`, `1.3 MB`.
fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn rgba_hex(rgba: image::Rgba<u8>) -> String {
    let [r, g, b, a] = rgba.0;
    if a == 255 {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

// ============================================================================
// Progress events
// ============================================================================

/// One progress line for an event payload, or `None` for payload-less events.
pub fn format_event(payload: &Payload<'_>) -> Option<String> {
    match payload {
        Payload::Message(message) => Some(format!("==> {message}")),
        Payload::Asset(asset) => Some(format!(
            "{}{} ({})",
            indent(1),
            asset.filename().unwrap_or(asset.name()),
            format_bytes(asset.content().len())
        )),
        Payload::None => None,
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(config: &Configuration) -> Vec<String> {
    let mut lines = Vec::new();
    if config.name == config.short_name {
        lines.push(config.name.clone());
    } else {
        lines.push(format!("{} (short name: {})", config.name, config.short_name));
    }
    if !config.description.is_empty() {
        lines.push(format!("{}Description: {}", indent(1), config.description));
    }
    lines.push(format!("{}Start URL: {}", indent(1), config.start_url));
    lines.push(format!("{}Scope: {}", indent(1), config.scope));
    lines.push(format!("{}Theme color: {}", indent(1), config.theme_color));
    lines.push(format!("{}Naming: {}", indent(1), config.naming.as_str()));
    if config.disabled {
        lines.push(format!("{}Disabled: generation will be skipped", indent(1)));
    }

    let icons = &config.icons;
    lines.push("Icons".to_string());
    lines.push(format!(
        "{}Base icon: {}",
        indent(1),
        icons.base_icon.display()
    ));
    let sizes: Vec<String> = icons.sizes.iter().map(u32::to_string).collect();
    lines.push(format!("{}Sizes: {}", indent(1), sizes.join(", ")));
    let formats: Vec<&str> = icons.formats.formats().map(|f| f.as_str()).collect();
    lines.push(format!("{}Formats: {}", indent(1), formats.join(", ")));
    lines.push(format!("{}Resize: {}", indent(1), icons.resize.as_str()));
    lines.push(format!(
        "{}Favicons: {}",
        indent(1),
        if icons.favicons { "yes" } else { "no" }
    ));
    lines.push(format!(
        "{}Apple touch icon: padding {}px on {}",
        indent(1),
        icons.apple_touch_icon_padding,
        rgba_hex(icons.apple_touch_icon_background)
    ));
    lines.push(format!("{}Tile color: {}", indent(1), icons.ms_tile_color));

    if !config.extra_params.is_empty() {
        lines.push("Manifest extras".to_string());
        for (key, value) in &config.extra_params {
            lines.push(format!("{}{key}: {value}", indent(1)));
        }
    }
    lines
}

pub fn print_check_output(config: &Configuration) {
    for line in format_check_output(config) {
        println!("{line}");
    }
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generation_summary(generation: &Generation, out_dir: &Path) -> Vec<String> {
    if generation.is_empty() {
        return vec!["Generation disabled, nothing written".to_string()];
    }
    let mut lines = vec![String::new(), "Files".to_string()];
    for asset in generation.assets() {
        lines.push(format!(
            "{}{} ({})",
            indent(1),
            asset.filename,
            format_bytes(asset.content.len())
        ));
    }
    let count = generation.generated_icons.len();
    lines.push(format!(
        "Generated {count} {} → {}",
        if count == 1 { "asset" } else { "assets" },
        out_dir.display()
    ));
    lines
}

pub fn print_generation_summary(generation: &Generation, out_dir: &Path) {
    for line in format_generation_summary(generation, out_dir) {
        println!("{line}");
    }
}
