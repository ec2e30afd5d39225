//! Mask channel state machine.
//!
//! `ChannelState` models the lifecycle of the pull channel with
//! validated transitions that return `Result` instead of panicking.

use std::time::{Duration, Instant};

use crate::error::MaskError;

// ── ChannelState ─────────────────────────────────────────────────

/// The current phase of the mask channel.
///
/// ```text
///  Connecting ──► Open ──► Closed ─┐
///      │  ▲         │              │
///      │  │         ▼              │
///      │  └───── Faulted ◄─────────┤ (after reconnect delay)
///      └──────────► Faulted/Closed ┘
/// ```
///
/// `Closed` and `Faulted` lead back to `Connecting` once the reconnect
/// delay elapses, unless the channel was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// A connection attempt is in progress. Initial state.
    #[default]
    Connecting,

    /// The link is up and the pull cycle is running.
    Open {
        /// When the channel entered the `Open` state.
        since: Instant,
    },

    /// The link was closed cleanly by either side.
    Closed,

    /// The link failed (refused, reset, protocol violation, timeout).
    Faulted,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl ChannelState {
    /// Short human-readable status label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open { .. } => "connected",
            Self::Closed => "disconnected",
            Self::Faulted => "error",
        }
    }

    /// Returns `true` while the pull cycle may exchange messages.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// How long the channel has been `Open`, or `None` in any other state.
    pub fn open_duration(&self) -> Option<Duration> {
        match self {
            Self::Open { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Open`.
    ///
    /// Valid from: `Connecting`.
    pub fn open(&mut self) -> Result<(), MaskError> {
        match self {
            Self::Connecting => {
                *self = Self::Open {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(MaskError::InvalidTransition(
                "cannot open: not in Connecting state",
            )),
        }
    }

    /// Transition to `Closed` after a clean close.
    ///
    /// Valid from: `Connecting`, `Open`.
    pub fn close(&mut self) -> Result<(), MaskError> {
        match self {
            Self::Connecting | Self::Open { .. } => {
                *self = Self::Closed;
                Ok(())
            }
            _ => Err(MaskError::InvalidTransition(
                "cannot close: not in Connecting or Open state",
            )),
        }
    }

    /// Transition to `Faulted` after a transport or protocol failure.
    ///
    /// Valid from: `Connecting`, `Open`.
    pub fn fault(&mut self) -> Result<(), MaskError> {
        match self {
            Self::Connecting | Self::Open { .. } => {
                *self = Self::Faulted;
                Ok(())
            }
            _ => Err(MaskError::InvalidTransition(
                "cannot fault: not in Connecting or Open state",
            )),
        }
    }

    /// Transition back to `Connecting` once the reconnect delay elapsed.
    ///
    /// Valid from: `Closed`, `Faulted`.
    pub fn reconnect(&mut self) -> Result<(), MaskError> {
        match self {
            Self::Closed | Self::Faulted => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(MaskError::InvalidTransition(
                "cannot reconnect: not in Closed or Faulted state",
            )),
        }
    }

    /// Force `Closed` regardless of current state. Used on teardown.
    pub fn force_close(&mut self) {
        *self = Self::Closed;
    }
}

// ── Tests ────────────────────────────────────────────────────────
