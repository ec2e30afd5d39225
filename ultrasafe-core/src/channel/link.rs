//! Transport seam for the pull channel.
//!
//! The pull loop only needs to open a link, send the pull token, and
//! read the next message. Keeping that behind two traits lets the
//! WebSocket transport and scripted test links drive the same loop.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::MaskError;

/// Control token the client sends to request exactly one frame.
pub const PULL_TOKEN: &str = "next";

/// One protocol-level message received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Textual message: keepalive / no frame available.
    Text(String),
    /// Binary message: one encoded mask frame.
    Binary(Bytes),
    /// The peer closed the link cleanly.
    Closed,
}

/// An open, bidirectional mask link.
#[async_trait]
pub trait MaskLink: Send {
    /// Send [`PULL_TOKEN`].
    async fn send_pull(&mut self) -> Result<(), MaskError>;

    /// Wait for the next protocol message.
    ///
    /// Must be cancel-safe: dropping the future before it completes
    /// must not lose a message.
    async fn recv(&mut self) -> Result<Inbound, MaskError>;

    /// Best-effort close. Never fails.
    async fn close(&mut self);
}

/// Opens [`MaskLink`]s to the mask endpoint.
#[async_trait]
pub trait MaskConnector: Send + Sync {
    type Link: MaskLink + 'static;

    /// Open a fresh link.
    async fn connect(&self) -> Result<Self::Link, MaskError>;
}
