//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between icon generation and pixel
//! work. Every transform takes the input by reference and returns a new
//! image, so a shared base icon is never mutated and every render starts
//! from an independent copy.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::{EncodeOptions, ResizeFit};
use image::Rgba;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported color: {0}")]
    UnsupportedColor(String),
}

/// Trait for image processing backends.
///
/// `Sync` because a stage renders its units in parallel against one backend.
pub trait ImageBackend: Sync {
    /// Decoded image handle. Cloning must be cheap enough to do per render.
    type Image: Clone + Send + Sync;

    /// Decode an image from disk, with an alpha channel.
    fn open(&self, path: &Path) -> Result<Self::Image, BackendError>;

    /// Resize to exactly `width`×`height` using the given fit policy.
    fn resize(
        &self,
        image: &Self::Image,
        width: u32,
        height: u32,
        fit: ResizeFit,
    ) -> Result<Self::Image, BackendError>;

    /// Extend every side by `padding` transparent pixels.
    fn pad(&self, image: &Self::Image, padding: u32) -> Result<Self::Image, BackendError>;

    /// Composite onto an opaque `background`, dropping the alpha channel.
    fn flatten(&self, image: &Self::Image, background: Rgba<u8>)
    -> Result<Self::Image, BackendError>;

    /// Encode to bytes in the format named by `options`.
    fn encode(&self, image: &Self::Image, options: &EncodeOptions)
    -> Result<Vec<u8>, BackendError>;
}
