//! Per-viewer overlay context.

use bytes::Bytes;

use crate::error::DecodeError;
use crate::overlay::compositor::Compositor;
use crate::overlay::decoder::MaskDecoder;
use crate::overlay::surface::SurfacePair;
use crate::overlay::types::{DecodedBitmap, HighlightColor};

/// Decoder, compositor and surfaces for one viewer instance.
///
/// Each viewer builds its own; nothing here is shared between viewers.
#[derive(Debug, Clone)]
pub struct MaskOverlay {
    decoder: MaskDecoder,
    compositor: Compositor,
    surfaces: SurfacePair,
}

impl MaskOverlay {
    pub fn new(translucency: f32, highlight: HighlightColor) -> Self {
        Self {
            decoder: MaskDecoder::new(),
            compositor: Compositor::new(translucency, highlight),
            surfaces: SurfacePair::new(),
        }
    }

    /// Decode one payload. Does not touch the surfaces.
    pub async fn decode(&self, payload: Bytes) -> Result<DecodedBitmap, DecodeError> {
        self.decoder.decode(payload).await
    }

    /// Size the surfaces to `bitmap` and composite it.
    ///
    /// Returns `true` if the surfaces were resized for this frame.
    pub fn render(&mut self, bitmap: DecodedBitmap) -> bool {
        let (width, height) = bitmap.dimensions();
        let resized = self.surfaces.ensure_size(width, height);
        self.compositor.composite(bitmap, &mut self.surfaces);
        resized
    }

    pub fn surfaces(&self) -> &SurfacePair {
        &self.surfaces
    }

    pub fn composite_count(&self) -> u64 {
        self.compositor.composite_count()
    }
}

impl Default for MaskOverlay {
    fn default() -> Self {
        Self {
            decoder: MaskDecoder::new(),
            compositor: Compositor::default(),
            surfaces: SurfacePair::new(),
        }
    }
}
