//! # Overlay pipeline
//!
//! Everything that happens to one mask frame after it leaves the wire.
//!
//! ```text
//! binary payload ──► MaskDecoder ──► DecodedBitmap
//!                                        │
//!                 SurfacePair::ensure_size(bitmap w × h)
//!                                        │
//!                                        ▼
//!                 Compositor::composite ──► visible surface
//!                                        │
//!                                 RateMeter::record_at
//! ```
//!
//! | Module       | Purpose                                           |
//! |------------- |---------------------------------------------------|
//! | `types`      | Bitmap, highlight colour and blend-mode types     |
//! | `surface`    | Canvas-style surfaces and the size-locked pair    |
//! | `decoder`    | PNG/JPEG payload → RGBA matte                     |
//! | `compositor` | Matte → translucent highlight                     |
//! | `context`    | Per-viewer decoder + compositor + surfaces        |
//! | `rate`       | Delivered-FPS meter                               |

pub mod compositor;
pub mod context;
pub mod decoder;
pub mod rate;
pub mod surface;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────

pub use compositor::{Compositor, DEFAULT_TRANSLUCENCY};
pub use context::MaskOverlay;
pub use decoder::MaskDecoder;
pub use rate::{RateMeter, fps_label};
pub use surface::{Surface, SurfacePair};
pub use types::{BlendMode, DecodedBitmap, HighlightColor};
