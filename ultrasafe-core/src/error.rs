//! Domain-specific error types for the mask stream.
//!
//! Link and state-machine operations return `Result<T, MaskError>`;
//! decoding returns `Result<T, DecodeError>`. None of these are fatal
//! to the viewer: connection faults are retried by the pull channel,
//! decode errors drop a single frame.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the mask-streaming pipeline.
#[derive(Debug, Error)]
pub enum MaskError {
    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The WebSocket layer reported an error (handshake, framing, close).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A connect attempt exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Protocol Errors ──────────────────────────────────────────
    /// The server broke the one-frame-per-pull discipline.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// A channel state transition was requested from the wrong state.
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),
}

// ── DecodeError ───────────────────────────────────────────────────

/// Why a binary mask payload was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload carried zero bytes.
    #[error("empty payload")]
    Empty,

    /// The payload is not a raster encoding the decoder understands.
    #[error("invalid image: {0}")]
    Image(#[from] image::ImageError),

    /// The image decoded to a zero-width or zero-height bitmap.
    #[error("zero-sized bitmap {width}x{height}")]
    ZeroSized { width: u32, height: u32 },

    /// The blocking decode job panicked or was cancelled.
    #[error("decode task aborted")]
    Aborted,
}

// ── Convenient From implementations ──────────────────────────────

impl From<tokio::task::JoinError> for DecodeError {
    fn from(_: tokio::task::JoinError) -> Self {
        DecodeError::Aborted
    }
}
