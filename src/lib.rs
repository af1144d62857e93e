//! # PWA Manifest
//!
//! A build-time generator for Progressive Web App assets. From one source
//! icon and a permissive options object it produces every derived icon, the
//! web app manifest, a `<head>` HTML snippet referencing all of it, and the
//! legacy Microsoft `browserconfig.xml`.
//!
//! # Architecture
//!
//! ```text
//! options bag ─ resolve ─▶ Configuration ─ Generator ─▶ Generation
//!                                             │        { browser_config,
//!                                             │          generated_icons,
//!                                             ▼          html, manifest }
//!                                         EventBus (progress + interception)
//! ```
//!
//! 1. **Resolve**: [`resolve::resolve`] normalizes aliases, applies the
//!    per-environment override, validates every field, and fails on the first
//!    violation. There is no partially built configuration.
//! 2. **Generate**: [`pipeline::Generator`] runs the stages in a fixed order
//!    (default icons, favicons, Apple touch icon, Microsoft tiles, manifest).
//!    Every encoded asset is published on the [`events`] bus, where a listener
//!    may rename it or replace its bytes, and is then named by the
//!    [`fingerprint`] scheme.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `Configuration` and `Meta`, loading options from JSON / TOML / `package.json`, stock options file |
//! | [`resolve`] | Alias schema, environment overlay, validation, extra manifest fields, `include` passthrough |
//! | [`fingerprint`] | Cache-busting output names: `name`, `content` or `none` |
//! | [`events`] | Closed event set, payloads, synchronous wildcard-first dispatch |
//! | [`imaging`] | `ImageBackend` trait and the pure-Rust `RustBackend` |
//! | [`pipeline`] | The `Generator` and its stages |
//! | [`manifest`] | Manifest assembly, HTML fragments, browser-config XML |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Listeners Run Synchronously
//!
//! A `*Gen` listener receives `&mut PendingAsset` and returns before the
//! stage names and records the asset. Overrides are therefore always seen,
//! and listeners observe assets in a stable order: ascending size, then
//! format.
//!
//! ## Parallel Encode, Ordered Publish
//!
//! Units within a stage never read each other's output, so they are encoded
//! in parallel with rayon. Publishing, naming and recording happen afterwards
//! on the calling thread, strictly in unit order.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging::RustBackend`] uses the `image` crate for decoding, Lanczos3
//! resizing and PNG / WebP / JPEG / TIFF encoding. No system libraries are
//! needed. Hosts with other requirements implement [`imaging::ImageBackend`].
//!
//! ## Filename Collisions
//!
//! Two assets that end up with the same name (typically from listener
//! overrides) are not an error: the later one wins and a warning is logged.

pub mod config;
pub mod events;
pub mod fingerprint;
pub mod imaging;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod resolve;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Initialize the tracing subscriber for the CLI.
///
/// `verbose` is the number of `-v` flags: 0 = WARN, 1 = INFO, 2 = DEBUG,
/// 3+ = TRACE. `RUST_LOG` directives are honored on top.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
