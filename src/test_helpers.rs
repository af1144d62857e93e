//! Shared test utilities for the pwa-manifest test suite.
//!
//! Provides a temporary directory holding a real base icon, resolved
//! configurations built on top of it, and an event recorder for generators.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let (_dir, config) = config_from(json!({"icons": {"sizes": [48]}}));
//! let mut generator = Generator::new(config);
//! let events = record_events(&mut generator);
//! generator.generate(&MockBackend::new()).unwrap();
//! assert_eq!(events.lock().unwrap()[0], "start");
//! ```

use image::{Rgba, RgbaImage};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::config::{Configuration, Meta};
use crate::events::Subscription;
use crate::pipeline::Generator;
use crate::resolve::resolve;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a `size`×`size` RGBA PNG with a diagonal gradient and a transparent
/// corner.
pub fn write_test_png(path: &Path, size: u32) {
    let img = RgbaImage::from_fn(size, size, |x, y| {
        if x < size / 4 && y < size / 4 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([(x * 255 / size) as u8, (y * 255 / size) as u8, 128, 255])
        }
    });
    img.save(path).unwrap();
}

/// Temp directory containing `icon.png`.
pub fn icon_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_test_png(&tmp.path().join("icon.png"), 64);
    tmp
}

/// [`Meta`] resolving the base icon against `dir`.
pub fn meta_for(dir: &TempDir) -> Meta {
    Meta {
        resolve_dir: dir.path().to_path_buf(),
        ..Meta::default()
    }
}

// =========================================================================
// Configurations
// =========================================================================

/// Minimal options (`name = "My App"`, `icons.baseIcon = "icon.png"`) with
/// `extra` merged on top. The `icons` object is merged key by key.
pub fn options_with(extra: Value) -> Value {
    let mut options = json!({"name": "My App", "icons": {"baseIcon": "icon.png"}});
    if let Value::Object(extra) = extra {
        for (key, value) in extra {
            match (key.as_str(), value) {
                ("icons", Value::Object(icons)) => {
                    for (k, v) in icons {
                        options["icons"][k.as_str()] = v;
                    }
                }
                (_, value) => options[key.as_str()] = value,
            }
        }
    }
    options
}

/// Resolve [`options_with`]`(extra)` against a fresh [`icon_dir`]. Keep the
/// returned directory alive while the configuration is in use.
pub fn config_from(extra: Value) -> (TempDir, Configuration) {
    let dir = icon_dir();
    let config = resolve(&options_with(extra), &meta_for(&dir), &Default::default())
        .unwrap_or_else(|e| panic!("test options failed to resolve: {e}"));
    (dir, config)
}

// =========================================================================
// Events
// =========================================================================

/// Record the name of every event the generator emits.
pub fn record_events(generator: &mut Generator) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    generator.on(Subscription::All, move |event, _| {
        sink.lock().unwrap().push(event.as_str().to_string())
    });
    log
}
