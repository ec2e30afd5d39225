//! Mask → translucent highlight compositor.
//!
//! Each frame runs the same fixed sequence against a [`SurfacePair`]:
//!
//! ```text
//! 1. clear visible + decode surfaces
//! 2. decode surface  ← bitmap (scaled to surface size)
//! 3. visible         ← decode surface, source-over @ translucency
//! 4. visible         ← flat highlight colour, source-in
//! 5. visible state   ← source-over, alpha 1.0
//! ```
//!
//! Step 3 leaves the mask footprint as an alpha matte; step 4 swaps the
//! matte's colour for the highlight while keeping its coverage. The
//! global alpha set in step 3 is still in effect during step 4, so the
//! final opacity is `translucency² × mask alpha × highlight alpha`.

use crate::overlay::surface::SurfacePair;
use crate::overlay::types::{BlendMode, DecodedBitmap, HighlightColor};

/// Default opacity applied when the mask is laid on the visible surface.
pub const DEFAULT_TRANSLUCENCY: f32 = 0.45;

/// Draws decoded masks onto the visible surface.
///
/// The only writer of the visible surface.
#[derive(Debug, Clone)]
pub struct Compositor {
    translucency: f32,
    highlight: HighlightColor,
    composites: u64,
}

impl Compositor {
    pub fn new(translucency: f32, highlight: HighlightColor) -> Self {
        Self {
            translucency: translucency.clamp(0.0, 1.0),
            highlight,
            composites: 0,
        }
    }

    /// Number of frames composited since construction.
    pub fn composite_count(&self) -> u64 {
        self.composites
    }

    /// Composite `bitmap` onto `surfaces`. Consumes the bitmap.
    ///
    /// Callers size the pair to the bitmap first with
    /// [`SurfacePair::ensure_size`].
    pub fn composite(&mut self, bitmap: DecodedBitmap, surfaces: &mut SurfacePair) {
        let (visible, decode) = surfaces.split_mut();

        visible.clear();
        decode.clear();

        decode.draw_image(bitmap.image());
        drop(bitmap);

        visible.set_blend_mode(BlendMode::SourceOver);
        visible.set_global_alpha(self.translucency);
        visible.draw_image(decode.pixels());

        visible.set_blend_mode(BlendMode::SourceIn);
        visible.fill(self.highlight);

        visible.set_blend_mode(BlendMode::SourceOver);
        visible.set_global_alpha(1.0);

        self.composites += 1;
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSLUCENCY, HighlightColor::RED)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn half_mask(w: u32, h: u32) -> DecodedBitmap {
        DecodedBitmap::new(RgbaImage::from_fn(w, h, |x, _| {
            if x < w / 2 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        }))
    }

    fn composite(mask: DecodedBitmap) -> (Compositor, SurfacePair) {
        let mut surfaces = SurfacePair::new();
        surfaces.ensure_size(mask.width(), mask.height());
        let mut comp = Compositor::default();
        comp.composite(mask, &mut surfaces);
        (comp, surfaces)
    }

    #[test]
    fn covered_pixels_turn_translucent_red() {
        let (_, surfaces) = composite(half_mask(8, 4));
        let px = surfaces.visible().pixels().get_pixel(0, 0);
        assert_eq!(&px.0[..3], &[255, 0, 0]);
        // 0.45 * (115 / 255) * 255 ≈ 51.75
        assert!((51..=52).contains(&px[3]), "alpha = {}", px[3]);
    }

    #[test]
    fn uncovered_pixels_stay_transparent() {
        let (_, surfaces) = composite(half_mask(8, 4));
        assert_eq!(surfaces.visible().pixels().get_pixel(7, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn transparent_mask_leaves_surface_clear() {
        let mask = DecodedBitmap::new(RgbaImage::new(5, 5));
        let (comp, surfaces) = composite(mask);
        assert_eq!(comp.composite_count(), 1);
        assert!(surfaces.visible().pixels().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn drawing_state_is_restored() {
        let (_, surfaces) = composite(half_mask(4, 4));
        assert_eq!(surfaces.visible().blend_mode(), BlendMode::SourceOver);
        assert_eq!(surfaces.visible().global_alpha(), 1.0);
    }

    #[test]
    fn previous_frame_is_fully_replaced() {
        let mut surfaces = SurfacePair::new();
        surfaces.ensure_size(4, 4);
        let mut comp = Compositor::default();

        comp.composite(half_mask(4, 4), &mut surfaces);
        comp.composite(DecodedBitmap::new(RgbaImage::new(4, 4)), &mut surfaces);

        assert_eq!(comp.composite_count(), 2);
        assert!(surfaces.visible().pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn custom_highlight_colour() {
        let mut surfaces = SurfacePair::new();
        surfaces.ensure_size(2, 2);
        let mut comp = Compositor::new(1.0, HighlightColor::from_rgba([0, 0, 255, 255]));
        comp.composite(
            DecodedBitmap::new(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]))),
            &mut surfaces,
        );
        assert_eq!(surfaces.visible().pixels().get_pixel(1, 1).0, [0, 0, 255, 255]);
    }
}
