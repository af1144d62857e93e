//! Image processing: the pixel side of icon generation.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` |
//! | **Resize** | Lanczos3, with cover / contain / fill fit policies |
//! | **Apple touch composite** | resize → transparent pad → flatten onto background |
//! | **Encode** | PNG, WebP, JPEG, TIFF encoders from `image` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for icon dimension math (unit testable)
//! - **Parameters**: Formats, fit policies, encoder options, CSS colors
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level renders combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
pub mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use operations::{
    AppleTouchConfig, IconSpec, render_apple_touch_icon, render_icon, render_icons,
};
pub use params::{
    EncodeOptions, JpegOptions, OutputFormat, PngOptions, Quality, ResizeFit, TiffOptions,
    WebpOptions, parse_css_color,
};
pub use rust_backend::RustBackend;
