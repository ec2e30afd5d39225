//! Shared types for the decode/composite pipeline.

use image::{Rgba, RgbaImage};

// ── DecodedBitmap ────────────────────────────────────────────────

/// A mask frame decoded to straight (non-premultiplied) RGBA.
///
/// Owned by the compositor for one composite call and dropped after.
#[derive(Debug, Clone)]
pub struct DecodedBitmap {
    image: RgbaImage,
}

impl DecodedBitmap {
    /// Wrap an RGBA raster.
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Bitmap width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Bitmap height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Borrow the underlying raster.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

// ── HighlightColor ───────────────────────────────────────────────

/// Flat colour painted over the mask footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightColor(pub Rgba<u8>);

impl HighlightColor {
    /// Opaque red, the default highlight.
    pub const RED: Self = Self(Rgba([255, 0, 0, 255]));

    /// Build from `[r, g, b, a]`.
    pub const fn from_rgba(rgba: [u8; 4]) -> Self {
        Self(Rgba(rgba))
    }
}

impl Default for HighlightColor {
    fn default() -> Self {
        Self::RED
    }
}

// ── BlendMode ────────────────────────────────────────────────────

/// Porter-Duff operator used when drawing onto a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source drawn over destination.
    #[default]
    SourceOver,
    /// Source kept only where the destination has alpha; destination
    /// colour is discarded.
    SourceIn,
}
