//! Client-paced mask pull channel.
//!
//! Owns the link lifecycle and the per-frame pipeline:
//!
//! ```text
//! connect ──► Open ──► send "next" ──► recv ─┬─ text   ──────────────────────┐
//!    ▲                       ▲               └─ binary ─► decode ─► render ─►┤
//!    │                       └───────────── record fps ◄─────────────────────┘
//!    │
//!    └── reconnect delay ◄── Closed / Faulted
//! ```
//!
//! At most one pull is outstanding at any time: the next token is only
//! sent once the previous reply has been fully handled, so the server
//! can never push faster than the client renders. A frame that arrives
//! with no pull outstanding is a protocol violation and faults the link.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use image::RgbaImage;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::channel::link::{Inbound, MaskConnector, MaskLink};
use crate::error::MaskError;
use crate::overlay::compositor::DEFAULT_TRANSLUCENCY;
use crate::overlay::context::MaskOverlay;
use crate::overlay::rate::{RateMeter, fps_label};
use crate::overlay::types::HighlightColor;
use crate::state::ChannelState;

/// Default pause between a close/fault and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

// ── PullConfig ───────────────────────────────────────────────────

/// Fixed tuning for one pull channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullConfig {
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,
    /// Opacity of the mask footprint on the visible surface.
    pub translucency: f32,
    /// Colour painted over the mask footprint.
    pub highlight: HighlightColor,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            translucency: DEFAULT_TRANSLUCENCY,
            highlight: HighlightColor::RED,
        }
    }
}

// ── ViewerStats ──────────────────────────────────────────────────

/// Connection-health and throughput telemetry exposed to the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerStats {
    /// Current channel state.
    pub state: ChannelState,
    /// Last delivered-FPS sample, `None` until the first window closes.
    pub fps: Option<u32>,
    /// Binary frames received, decodable or not.
    pub frames_delivered: u64,
    /// Frames that were decoded and composited.
    pub frames_rendered: u64,
    /// Frames dropped because they failed to decode.
    pub frames_dropped: u64,
    /// Text (keepalive) replies received.
    pub keepalives: u64,
    /// Pull tokens sent.
    pub pulls_sent: u64,
    /// Reconnects scheduled after a close or fault.
    pub reconnects_scheduled: u64,
    /// Surface resizes performed.
    pub surface_resizes: u64,
    /// Current surface width.
    pub width: u32,
    /// Current surface height.
    pub height: u32,
}

impl ViewerStats {
    /// FPS for a status line, `"--"` while unknown.
    pub fn fps_label(&self) -> String {
        fps_label(self.fps)
    }
}

// ── ShutdownHandle ───────────────────────────────────────────────

/// Cloneable teardown handle for a running [`PullChannel`].
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Stop the channel for good: cancels a pending reconnect, closes
    /// the live link and discards any decode still in flight. Safe to
    /// call from any state, any number of times.
    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }
}

// ── PullChannel ──────────────────────────────────────────────────

/// How one link ended.
#[derive(Debug)]
enum LinkOutcome {
    TornDown,
    Closed,
    Faulted(MaskError),
}

/// Pull-protocol client and overlay driver.
///
/// Composited frames are published through a `watch` channel so a
/// display can read the latest surface without blocking the pull loop.
/// The surface is only copied out while at least one frame receiver is
/// alive.
pub struct PullChannel<C: MaskConnector> {
    connector: C,
    config: PullConfig,
    state: ChannelState,
    overlay: MaskOverlay,
    meter: RateMeter,
    stats: ViewerStats,
    shutdown: ShutdownHandle,
    stats_tx: watch::Sender<ViewerStats>,
    frame_tx: watch::Sender<Arc<RgbaImage>>,
}

impl<C: MaskConnector> PullChannel<C> {
    pub fn new(connector: C, config: PullConfig) -> Self {
        let (stats_tx, _) = watch::channel(ViewerStats::default());
        let (frame_tx, _) = watch::channel(Arc::new(RgbaImage::new(0, 0)));
        Self {
            connector,
            config,
            state: ChannelState::default(),
            overlay: MaskOverlay::new(config.translucency, config.highlight),
            meter: RateMeter::starting_at(now()),
            stats: ViewerStats::default(),
            shutdown: ShutdownHandle::default(),
            stats_tx,
            frame_tx,
        }
    }

    /// Receiver for telemetry updates.
    pub fn stats_receiver(&self) -> watch::Receiver<ViewerStats> {
        self.stats_tx.subscribe()
    }

    /// Receiver for the latest composited surface.
    pub fn frame_receiver(&self) -> watch::Receiver<Arc<RgbaImage>> {
        self.frame_tx.subscribe()
    }

    /// A cloneable teardown handle.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn overlay(&self) -> &MaskOverlay {
        &self.overlay
    }

    /// Run until [`ShutdownHandle::teardown`] is called.
    ///
    /// Connection faults never end the loop; they are retried after
    /// the configured delay, indefinitely.
    pub async fn run(&mut self) -> Result<(), MaskError> {
        let cancel = self.shutdown.token.clone();

        loop {
            self.publish_stats();

            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                connected = self.connector.connect() => Some(connected),
            };

            let outcome = match connected {
                None => LinkOutcome::TornDown,
                Some(Ok(mut link)) => {
                    self.state.open()?;
                    info!("mask channel open");
                    let outcome = self.pump(&mut link, &cancel).await;
                    link.close().await;
                    outcome
                }
                Some(Err(e)) => LinkOutcome::Faulted(e),
            };

            let open_for = self.state.open_duration();
            match outcome {
                LinkOutcome::TornDown => break,
                LinkOutcome::Closed => {
                    self.state.close()?;
                    info!(?open_for, delay = ?self.config.reconnect_delay, "mask channel closed; reconnecting");
                }
                LinkOutcome::Faulted(e) => {
                    self.state.fault()?;
                    warn!(error = %e, ?open_for, delay = ?self.config.reconnect_delay, "mask channel fault; reconnecting");
                }
            }

            self.stats.reconnects_scheduled += 1;
            self.publish_stats();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
            self.state.reconnect()?;
        }

        self.state.force_close();
        self.publish_stats();
        info!("mask channel torn down");
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Drive the pull cycle on one open link until it ends.
    async fn pump(&mut self, link: &mut C::Link, cancel: &CancellationToken) -> LinkOutcome {
        loop {
            if let Err(e) = self.pull(link).await {
                return LinkOutcome::Faulted(e);
            }
            self.publish_stats();

            let inbound = tokio::select! {
                biased;
                _ = cancel.cancelled() => return LinkOutcome::TornDown,
                inbound = link.recv() => inbound,
            };

            match inbound {
                Ok(Inbound::Text(text)) => {
                    self.stats.keepalives += 1;
                    trace!(%text, "keepalive");
                }
                Ok(Inbound::Binary(payload)) => {
                    if !self.handle_frame(payload, cancel).await {
                        return LinkOutcome::TornDown;
                    }
                }
                Ok(Inbound::Closed) => return LinkOutcome::Closed,
                Err(e) => return LinkOutcome::Faulted(e),
            }

            if let Some(outcome) = self.drain_unsolicited(link) {
                return outcome;
            }
        }
    }

    /// Look for messages that arrived while no pull was outstanding.
    fn drain_unsolicited(&mut self, link: &mut C::Link) -> Option<LinkOutcome> {
        loop {
            match link.recv().now_or_never()? {
                Ok(Inbound::Binary(_)) => {
                    warn!("binary frame arrived with no pull outstanding");
                    return Some(LinkOutcome::Faulted(MaskError::ProtocolViolation(
                        "binary frame without an outstanding pull",
                    )));
                }
                Ok(Inbound::Text(text)) => debug!(%text, "discarding unsolicited text"),
                Ok(Inbound::Closed) => return Some(LinkOutcome::Closed),
                Err(e) => return Some(LinkOutcome::Faulted(e)),
            }
        }
    }

    async fn pull(&mut self, link: &mut C::Link) -> Result<(), MaskError> {
        link.send_pull().await?;
        self.stats.pulls_sent += 1;
        Ok(())
    }

    /// Decode, render and count one binary frame.
    ///
    /// Returns `false` if teardown happened while decoding; the late
    /// result is discarded without touching the surfaces.
    async fn handle_frame(&mut self, payload: Bytes, cancel: &CancellationToken) -> bool {
        let len = payload.len();
        let decoded = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            decoded = self.overlay.decode(payload) => decoded,
        };

        match decoded {
            Ok(bitmap) => {
                let resized = self.overlay.render(bitmap);
                let surfaces = self.overlay.surfaces();
                let (width, height) = surfaces.dimensions();
                self.stats.surface_resizes = surfaces.resize_count();
                self.stats.width = width;
                self.stats.height = height;
                self.stats.frames_rendered += 1;
                if !self.frame_tx.is_closed() {
                    self.frame_tx
                        .send_replace(Arc::new(surfaces.visible().pixels().clone()));
                }
                trace!(len, width, height, resized, "mask frame composited");
            }
            Err(e) => {
                self.stats.frames_dropped += 1;
                debug!(len, error = %e, "dropping undecodable mask frame");
            }
        }

        self.stats.frames_delivered += 1;
        self.meter.record_at(now());
        self.stats.fps = self.meter.last_fps();
        true
    }

    fn publish_stats(&mut self) {
        self.stats.state = self.state;
        self.stats_tx.send_replace(self.stats.clone());
    }
}

/// Wall-clock instant taken from tokio's clock, so paused-time tests
/// see the same time as the reconnect timer.
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

// ── Tests ────────────────────────────────────────────────────────
