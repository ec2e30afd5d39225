//! # ultrasafe-core
//!
//! Live segmentation-mask overlay for the Ultrasafe ultrasound viewer.
//!
//! This crate contains:
//! - **Channel**: `PullChannel`, a client-paced pull protocol over a
//!   persistent WebSocket with fixed-delay reconnect
//! - **Overlay**: `MaskDecoder`, `SurfacePair`, `Compositor` turning
//!   mask frames into a translucent highlight surface
//! - **Telemetry**: `RateMeter` and `ViewerStats` for FPS and
//!   connection health
//! - **State**: `ChannelState`, the validated channel state machine
//! - **Error**: `MaskError`, a typed `thiserror`-based error hierarchy

pub mod channel;
pub mod error;
pub mod overlay;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use channel::{
    Inbound, MaskConnector, MaskLink, PULL_TOKEN, PullChannel, PullConfig, ShutdownHandle,
    ViewerStats, WsConnector, WsLink,
};
pub use error::{DecodeError, MaskError};
pub use overlay::{
    BlendMode, Compositor, DecodedBitmap, HighlightColor, MaskDecoder, MaskOverlay, RateMeter,
    Surface, SurfacePair,
};
pub use state::ChannelState;
