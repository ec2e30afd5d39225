//! # Mask channel
//!
//! Client-paced delivery of mask frames over a persistent connection.
//!
//! ```text
//! CLIENT (viewer)                         SERVER (/ws/mask)
//! ┌────────────────────────┐   "next"     ┌──────────────────────┐
//! │ PullChannel            │ ──────────►  │ mask producer        │
//! │   ↑ MaskLink::recv     │ ◄──────────  │ one reply per pull:  │
//! │   ↓ MaskOverlay        │  text|binary │  text = no frame     │
//! └────────────────────────┘              └──────────────────────┘
//! ```
//!
//! | Module | Purpose                                              |
//! |------- |------------------------------------------------------|
//! | `link` | `MaskConnector` / `MaskLink` transport traits         |
//! | `ws`   | WebSocket transport via tokio-tungstenite             |
//! | `pull` | Pull loop, reconnect timer, telemetry                 |

pub mod link;
pub mod pull;
pub mod ws;

// ── Re-exports ───────────────────────────────────────────────────

pub use link::{Inbound, MaskConnector, MaskLink, PULL_TOKEN};
pub use pull::{DEFAULT_RECONNECT_DELAY, PullChannel, PullConfig, ShutdownHandle, ViewerStats};
pub use ws::{DEFAULT_CONNECT_TIMEOUT, WsConnector, WsLink};
