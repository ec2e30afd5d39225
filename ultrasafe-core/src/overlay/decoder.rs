//! Mask payload decoder.
//!
//! Turns the raw bytes of one binary frame (PNG or JPEG) into a
//! [`DecodedBitmap`]. Format decoding is CPU-bound, so the async entry
//! point runs it on the blocking pool and suspends until it finishes.

use bytes::Bytes;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::DecodeError;
use crate::overlay::types::DecodedBitmap;

// ── MaskDecoder ──────────────────────────────────────────────────

/// Stateless mask decoder.
///
/// Images that carry an alpha channel keep it. Images without one
/// (the usual single-channel segmentation PNG) use their luminance as
/// alpha, so black pixels contribute nothing to the highlight.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskDecoder;

impl MaskDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode `payload` off the async thread.
    pub async fn decode(&self, payload: Bytes) -> Result<DecodedBitmap, DecodeError> {
        tokio::task::spawn_blocking(move || Self::decode_blocking(&payload)).await?
    }

    /// Decode synchronously on the calling thread.
    pub fn decode_blocking(payload: &[u8]) -> Result<DecodedBitmap, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::Empty);
        }

        let decoded = image::load_from_memory(payload)?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroSized { width, height });
        }

        Ok(DecodedBitmap::new(to_matte(decoded)))
    }
}

/// Normalise any decoded image to straight RGBA with a meaningful alpha.
fn to_matte(decoded: DynamicImage) -> RgbaImage {
    if decoded.color().has_alpha() {
        return decoded.into_rgba8();
    }
    let luma = decoded.into_luma8();
    RgbaImage::from_fn(luma.width(), luma.height(), |x, y| {
        let l = luma.get_pixel(x, y)[0];
        Rgba([l, l, l, l])
    })
}

// ── Tests ────────────────────────────────────────────────────────
