//! Icon generation pipeline.
//!
//! A [`Generator`] runs a fixed sequence of stages over one resolved
//! [`Configuration`]:
//!
//! ```text
//! start
//!   1. default icons     every size × every format      → manifest icons
//!   2. favicons          32, 16 (PNG, optional)         → <link rel="icon">
//!   3. apple touch icon  180×180 padded + flattened     → <link rel="apple-touch-icon">
//!   4. microsoft tiles   70, 150, 310 square + 310×150  → browserconfig.xml
//!   5. manifest          icons + extras                 → <link rel="manifest">
//! end
//! ```
//!
//! Within a stage the units are rendered in parallel, then published one at a
//! time in unit order: each encoded asset is emitted on the stage's `*Gen`
//! event as a [`PendingAsset`], named (listener override, or fingerprint),
//! recorded, and referenced from the HTML, manifest or browser config. Event
//! order is therefore ascending size, then format, exactly as configured.
//!
//! The first failed unit aborts the run. Nothing is retried.

use crate::config::Configuration;
use crate::events::{Event, EventBus, Payload, PendingAsset, Stage, Subscription};
use crate::fingerprint::{Fingerprinter, HashMethod};
use crate::imaging::calculations::{
    APPLE_TOUCH_ICON_SIZE, FAVICON_SIZES, MS_TILE_SIZES, MS_WIDE_TILE, size_label,
};
use crate::imaging::{
    BackendError, EncodeOptions, IconSpec, ImageBackend, render_apple_touch_icon, render_icons,
};
use crate::manifest::{
    BROWSER_CONFIG_FILENAME, IconEntry, MANIFEST_FILENAME, ManifestDocument, browser_config_xml,
    build_manifest, icon_link_html, initial_head_html, manifest_link_html, tile_color_xml,
    tile_logo_xml,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name the CLI writes the accumulated head HTML to.
pub const HEAD_HTML_FILENAME: &str = "pwa-head.html";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Could not open the base icon at {path}: {source}")]
    BaseIcon { path: String, source: BackendError },
    #[error("An error occurred during the {stage} creation process: {source}")]
    Stage { stage: Stage, source: BackendError },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A finalized output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedAsset<'a> {
    pub filename: &'a str,
    pub content: &'a [u8],
}

/// Everything one run produced.
///
/// A disabled configuration yields [`Generation::default`]: all fields empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub browser_config: String,
    pub generated_icons: BTreeMap<String, Vec<u8>>,
    pub html: String,
    pub manifest: ManifestDocument,
}

impl Generation {
    pub fn is_empty(&self) -> bool {
        self.browser_config.is_empty()
            && self.generated_icons.is_empty()
            && self.html.is_empty()
            && self.manifest.is_empty()
    }

    pub fn assets(&self) -> impl Iterator<Item = GeneratedAsset<'_>> {
        self.generated_icons
            .iter()
            .map(|(filename, content)| GeneratedAsset {
                filename,
                content,
            })
    }

    /// Write every asset, the manifest, the browser config and the head HTML
    /// into `dir`. Returns the written paths in write order.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
        let mut written = Vec::new();
        if self.is_empty() {
            return Ok(written);
        }
        fs::create_dir_all(dir)?;

        let mut write = |name: &str, content: &[u8]| -> Result<(), GenerateError> {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            written.push(path);
            Ok(())
        };
        for asset in self.assets() {
            write(asset.filename, asset.content)?;
        }
        write(MANIFEST_FILENAME, self.manifest.to_json_pretty()?.as_bytes())?;
        write(BROWSER_CONFIG_FILENAME, self.browser_config.as_bytes())?;
        write(HEAD_HTML_FILENAME, self.html.as_bytes())?;
        Ok(written)
    }
}

/// Where a recorded asset gets referenced.
enum Reference {
    ManifestIcon { sizes: String, mime_type: &'static str },
    HeadLink { rel: &'static str, sizes: String },
    TileLogo { element: String },
}

/// One asset a stage will publish.
struct Unit {
    name: String,
    reference: Reference,
}

/// Accumulated output of the run in progress.
#[derive(Debug, Default)]
struct RunState {
    generated_icons: BTreeMap<String, Vec<u8>>,
    html: String,
    tile_body: String,
    icons: Vec<IconEntry>,
}

/// Runs the generation stages for one configuration.
#[derive(Debug)]
pub struct Generator {
    config: Configuration,
    fingerprinter: Fingerprinter,
    events: EventBus,
    state: RunState,
}

impl Generator {
    pub fn new(config: Configuration) -> Self {
        let fingerprinter = Fingerprinter::new(config.naming);
        let state = RunState {
            tile_body: tile_color_xml(&config.icons.ms_tile_color),
            ..RunState::default()
        };
        Self {
            config,
            fingerprinter,
            events: EventBus::new(),
            state,
        }
    }

    /// Replace the naming mode chosen by the configuration.
    pub fn with_hash_method(mut self, method: HashMethod) -> Self {
        self.fingerprinter = self.fingerprinter.with_method(method);
        self
    }

    /// Replace the SHA-256 fingerprint hash.
    pub fn with_hash_function<F>(mut self, hash: F) -> Self
    where
        F: Fn(&[u8]) -> String + Send + Sync + 'static,
    {
        self.fingerprinter = self.fingerprinter.with_hash_function(hash);
        self
    }

    pub fn hash_method(&self) -> HashMethod {
        self.fingerprinter.method()
    }

    /// Register an event listener. See [`EventBus::on`].
    pub fn on<F>(&mut self, subscription: impl Into<Subscription>, listener: F) -> &mut Self
    where
        F: FnMut(Event, &mut Payload<'_>) + Send + 'static,
    {
        self.events.on(subscription, listener);
        self
    }

    /// Register a listener for one stage's generated assets.
    pub fn on_asset<F>(&mut self, stage: Stage, listener: F) -> &mut Self
    where
        F: FnMut(&mut PendingAsset) + Send + 'static,
    {
        self.events.on_asset(stage, listener);
        self
    }

    pub fn emit(&mut self, event: Event, payload: Payload<'_>) -> bool {
        self.events.emit(event, payload)
    }

    /// The browser config as of now: only the tile color before a run, every
    /// tile logo after one.
    pub fn browser_config(&self) -> String {
        browser_config_xml(&self.state.tile_body)
    }

    /// Run every stage and return the result.
    pub fn generate<B: ImageBackend>(&mut self, backend: &B) -> Result<Generation, GenerateError> {
        if self.config.disabled {
            info!("generation disabled, skipping");
            return Ok(Generation::default());
        }

        self.state = RunState {
            html: initial_head_html(&self.config.base_url, &self.config.theme_color),
            tile_body: tile_color_xml(&self.config.icons.ms_tile_color),
            ..RunState::default()
        };
        info!(
            name = %self.config.name,
            icon = %self.config.icons.base_icon.display(),
            "generating PWA assets"
        );
        self.events.emit(Event::Start, Payload::None);

        let base = backend
            .open(&self.config.icons.base_icon)
            .map_err(|source| GenerateError::BaseIcon {
                path: self.config.icons.base_icon.display().to_string(),
                source,
            })?;

        self.default_icons(backend, &base)?;
        if self.config.icons.favicons {
            self.favicons(backend, &base)?;
        }
        self.apple_touch_icon(backend, &base)?;
        self.ms_tiles(backend, &base)?;
        let manifest = self.manifest();

        self.events.emit(Event::End, Payload::None);

        let state = std::mem::take(&mut self.state);
        self.state.tile_body = state.tile_body.clone();
        let generation = Generation {
            browser_config: browser_config_xml(&state.tile_body),
            generated_icons: state.generated_icons,
            html: state.html,
            manifest,
        };
        info!(
            assets = generation.generated_icons.len(),
            "generated PWA assets"
        );
        Ok(generation)
    }

    // =========================================================================
    // Stages
    // =========================================================================

    fn default_icons<B: ImageBackend>(
        &mut self,
        backend: &B,
        base: &B::Image,
    ) -> Result<(), GenerateError> {
        let icons = &self.config.icons;
        let mut specs = Vec::new();
        let mut units = Vec::new();
        for &size in &icons.sizes {
            for options in icons.formats.iter() {
                let format = options.format();
                let spec = IconSpec::square(size, *options);
                units.push(Unit {
                    name: format!("{}-{}.{format}", icons.base_icon_name, spec.size_label()),
                    reference: Reference::ManifestIcon {
                        sizes: spec.size_label(),
                        mime_type: format.mime_type(),
                    },
                });
                specs.push(spec);
            }
        }
        let fit = icons.resize;
        let message = format!("Generating icons for {}...", self.config.name);
        self.run_stage(Stage::DefaultIcons, &message, units, || {
            render_icons(backend, base, &specs, fit)
        })
    }

    fn favicons<B: ImageBackend>(
        &mut self,
        backend: &B,
        base: &B::Image,
    ) -> Result<(), GenerateError> {
        let png = EncodeOptions::Png(self.config.icons.png());
        let specs: Vec<IconSpec> = FAVICON_SIZES
            .iter()
            .map(|&size| IconSpec::square(size, png))
            .collect();
        let units = specs
            .iter()
            .map(|spec| Unit {
                name: format!("favicon-{}.png", spec.size_label()),
                reference: Reference::HeadLink {
                    rel: "icon",
                    sizes: spec.size_label(),
                },
            })
            .collect();
        let fit = self.config.icons.resize;
        self.run_stage(Stage::Favicon, "Generating favicons...", units, || {
            render_icons(backend, base, &specs, fit)
        })
    }

    fn apple_touch_icon<B: ImageBackend>(
        &mut self,
        backend: &B,
        base: &B::Image,
    ) -> Result<(), GenerateError> {
        let config = self.config.icons.apple_touch();
        let units = vec![Unit {
            name: "apple-touch-icon.png".to_string(),
            reference: Reference::HeadLink {
                rel: "apple-touch-icon",
                sizes: size_label(APPLE_TOUCH_ICON_SIZE, APPLE_TOUCH_ICON_SIZE),
            },
        }];
        self.run_stage(
            Stage::AppleTouchIcon,
            "Generating Apple Touch Icon...",
            units,
            || vec![render_apple_touch_icon(backend, base, &config)],
        )
    }

    fn ms_tiles<B: ImageBackend>(
        &mut self,
        backend: &B,
        base: &B::Image,
    ) -> Result<(), GenerateError> {
        let png = EncodeOptions::Png(self.config.icons.png());
        let (wide_width, wide_height) = MS_WIDE_TILE;
        let mut specs: Vec<IconSpec> = MS_TILE_SIZES
            .iter()
            .map(|&size| IconSpec::square(size, png))
            .collect();
        specs.push(IconSpec {
            width: wide_width,
            height: wide_height,
            options: png,
        });
        let units = specs
            .iter()
            .map(|spec| {
                let shape = if spec.width == spec.height { "square" } else { "wide" };
                Unit {
                    name: format!("mstile-{}.png", spec.size_label()),
                    reference: Reference::TileLogo {
                        element: format!("{shape}{}logo", spec.size_label()),
                    },
                }
            })
            .collect();
        let fit = self.config.icons.resize;
        self.run_stage(
            Stage::MsTile,
            "Generating Microsoft Tile Icons...",
            units,
            || render_icons(backend, base, &specs, fit),
        )
    }

    fn manifest(&mut self) -> ManifestDocument {
        let manifest = build_manifest(&self.config, &self.state.icons);
        self.state
            .html
            .push_str(&manifest_link_html(&self.config.base_url));
        manifest
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    fn run_stage<F>(
        &mut self,
        stage: Stage,
        message: &str,
        units: Vec<Unit>,
        render: F,
    ) -> Result<(), GenerateError>
    where
        F: FnOnce() -> Vec<Result<Vec<u8>, BackendError>>,
    {
        self.events
            .emit(stage.start_event(), Payload::Message(message));
        let rendered = render();
        for (unit, result) in units.into_iter().zip(rendered) {
            let content = result.map_err(|source| GenerateError::Stage { stage, source })?;
            self.publish(stage, unit, content);
        }
        self.events.emit(stage.end_event(), Payload::None);
        Ok(())
    }

    fn publish(&mut self, stage: Stage, unit: Unit, content: Vec<u8>) {
        let mut pending = PendingAsset::new(unit.name, content);
        self.events
            .emit(stage.gen_event(), Payload::Asset(&mut pending));
        let filename = match pending.filename() {
            Some(forced) => forced.to_string(),
            None => self
                .fingerprinter
                .fingerprint(pending.name(), pending.content()),
        };
        let (content, _) = pending.into_parts();
        let src = format!("{}{filename}", self.config.base_url);

        debug!(stage = %stage, filename = %filename, bytes = content.len(), "recorded asset");
        if self
            .state
            .generated_icons
            .insert(filename.clone(), content)
            .is_some()
        {
            warn!(filename = %filename, "replaced an asset generated earlier under the same name");
        }

        match unit.reference {
            Reference::ManifestIcon { sizes, mime_type } => self.state.icons.push(IconEntry {
                src,
                sizes,
                mime_type: mime_type.to_string(),
            }),
            Reference::HeadLink { rel, sizes } => {
                self.state.html.push_str(&icon_link_html(rel, &sizes, &src))
            }
            Reference::TileLogo { element } => {
                self.state.tile_body.push_str(&tile_logo_xml(&element, &src))
            }
        }
    }
}
