//! Pure calculation functions for icon dimensions.
//!
//! No I/O, fully unit testable.

/// Canvas size of the Apple touch icon.
pub const APPLE_TOUCH_ICON_SIZE: u32 = 180;

/// Favicon sizes, in render order.
pub const FAVICON_SIZES: [u32; 2] = [32, 16];

/// Square Microsoft tile sizes, in render order.
pub const MS_TILE_SIZES: [u32; 3] = [70, 150, 310];

/// The one non-square Microsoft tile.
pub const MS_WIDE_TILE: (u32, u32) = (310, 150);

/// Sizes every manifest needs for installability.
pub const REQUIRED_SIZES: [u32; 2] = [192, 512];

/// Side length of the artwork inside a padded Apple touch icon.
///
/// Returns `None` when the padding leaves no room for artwork.
pub fn apple_touch_artwork_size(padding: u32) -> Option<u32> {
    APPLE_TOUCH_ICON_SIZE
        .checked_sub(padding.checked_mul(2)?)
        .filter(|&size| size > 0)
}

/// `WxH` label used in filenames, `sizes` attributes and tile element names.
pub fn size_label(width: u32, height: u32) -> String {
    format!("{width}x{height}")
}

/// Add the required sizes, deduplicate, and sort ascending.
///
/// Ascending order is the render and event order of the default icon stage.
pub fn normalize_sizes(sizes: &[u32]) -> Vec<u32> {
    let mut out: Vec<u32> = sizes.iter().chain(REQUIRED_SIZES.iter()).copied().collect();
    out.sort_unstable();
    out.dedup();
    out
}
