//! Pixel surfaces and the pair that keeps them the same size.
//!
//! A [`Surface`] is a small 2D drawing context over an [`RgbaImage`]:
//! it carries a persistent blend mode and global alpha that apply to
//! every draw, the same model a browser canvas uses. The
//! [`SurfacePair`] owns the visible surface and the hidden decode
//! surface and is the only place their dimensions change.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::overlay::types::{BlendMode, HighlightColor};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

// ── Surface ──────────────────────────────────────────────────────

/// A mutable RGBA raster with canvas-style drawing state.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
    blend: BlendMode,
    global_alpha: f32,
}

impl Surface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            blend: BlendMode::SourceOver,
            global_alpha: 1.0,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Current pixel contents.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    pub fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    /// Set the opacity multiplier applied to every subsequent draw.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        self.global_alpha = alpha.clamp(0.0, 1.0);
    }

    /// Reallocate to `width × height`. Contents are cleared and the
    /// drawing state is reset, as when a canvas is resized.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    /// Set every pixel to transparent black. Ignores blend state.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = TRANSPARENT;
        }
    }

    /// Draw `src` scaled to cover the whole surface.
    pub fn draw_image(&mut self, src: &RgbaImage) {
        let (w, h) = self.dimensions();
        if w == 0 || h == 0 || src.width() == 0 || src.height() == 0 {
            return;
        }
        let scaled: Cow<'_, RgbaImage> = if src.dimensions() == (w, h) {
            Cow::Borrowed(src)
        } else {
            Cow::Owned(imageops::resize(src, w, h, FilterType::Triangle))
        };

        let (blend, alpha) = (self.blend, self.global_alpha);
        for (dst, s) in self.pixels.pixels_mut().zip(scaled.pixels()) {
            *dst = blend_pixel(blend, *s, *dst, alpha);
        }
    }

    /// Fill the whole surface with a flat colour under the current blend state.
    pub fn fill(&mut self, color: HighlightColor) {
        let (blend, alpha) = (self.blend, self.global_alpha);
        for dst in self.pixels.pixels_mut() {
            *dst = blend_pixel(blend, color.0, *dst, alpha);
        }
    }
}

/// Blend one straight-alpha source pixel onto a destination pixel.
fn blend_pixel(mode: BlendMode, src: Rgba<u8>, dst: Rgba<u8>, global_alpha: f32) -> Rgba<u8> {
    let sa = f32::from(src[3]) / 255.0 * global_alpha;
    let da = f32::from(dst[3]) / 255.0;

    match mode {
        BlendMode::SourceOver => {
            let oa = sa + da * (1.0 - sa);
            if oa <= 0.0 {
                return TRANSPARENT;
            }
            let mix = |i: usize| {
                (f32::from(src[i]) * sa + f32::from(dst[i]) * da * (1.0 - sa)) / oa
            };
            Rgba([to_channel(mix(0)), to_channel(mix(1)), to_channel(mix(2)), to_channel(oa * 255.0)])
        }
        BlendMode::SourceIn => {
            let oa = sa * da;
            if oa <= 0.0 {
                return TRANSPARENT;
            }
            Rgba([src[0], src[1], src[2], to_channel(oa * 255.0)])
        }
    }
}

fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

// ── SurfacePair ──────────────────────────────────────────────────

/// The visible composited surface plus the hidden decode surface.
///
/// Both start unset (0×0) and are always resized together.
#[derive(Debug, Clone)]
pub struct SurfacePair {
    visible: Surface,
    decode: Surface,
    resizes: u64,
}

impl SurfacePair {
    pub fn new() -> Self {
        Self {
            visible: Surface::new(0, 0),
            decode: Surface::new(0, 0),
            resizes: 0,
        }
    }

    /// Resize both surfaces to exactly `width × height` if either differs.
    ///
    /// Returns `true` when a resize happened. Cheap to call every frame.
    pub fn ensure_size(&mut self, width: u32, height: u32) -> bool {
        let target = (width, height);
        if self.visible.dimensions() == target && self.decode.dimensions() == target {
            return false;
        }
        tracing::debug!(
            from = ?self.visible.dimensions(),
            to = ?target,
            "resizing overlay surfaces"
        );
        self.visible.resize(width, height);
        self.decode.resize(width, height);
        self.resizes += 1;
        true
    }

    /// `(width, height)` shared by both surfaces.
    pub fn dimensions(&self) -> (u32, u32) {
        self.visible.dimensions()
    }

    /// Number of resizes performed since construction.
    pub fn resize_count(&self) -> u64 {
        self.resizes
    }

    pub fn visible(&self) -> &Surface {
        &self.visible
    }

    pub fn decode(&self) -> &Surface {
        &self.decode
    }

    /// Mutable access to both surfaces at once.
    pub fn split_mut(&mut self) -> (&mut Surface, &mut Surface) {
        (&mut self.visible, &mut self.decode)
    }
}

impl Default for SurfacePair {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
