//! Viewer configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use ultrasafe_core::{HighlightColor, PullConfig};

use crate::status::SnapshotWriter;

/// Top-level configuration for the viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Mask endpoint settings.
    pub network: NetworkConfig,
    /// Compositing and reconnect tuning.
    pub overlay: OverlayConfig,
    /// Snapshot output.
    pub output: OutputConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Mask endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP base of the backend, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Path of the mask socket under `base_url`.
    pub mask_path: String,
    /// Bound on one connect + handshake attempt, in milliseconds.
    pub connect_timeout_ms: u64,
}

/// Compositing and reconnect tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Opacity of the mask footprint (0.0 – 1.0).
    pub translucency: f32,
    /// Highlight colour as `[r, g, b, a]`.
    pub highlight_color: [u8; 4],
    /// Delay before each reconnect attempt, in milliseconds.
    pub reconnect_delay_ms: u64,
}

/// Snapshot output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// PNG file the composited overlay is written to. Empty disables.
    pub snapshot_path: String,
    /// Write every Nth composited frame.
    pub snapshot_every: u32,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`.
    pub level: String,
}

/// Why the configured endpoint cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("secure websocket (wss) endpoints are not supported by this build")]
    TlsUnsupported,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            overlay: OverlayConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            mask_path: "/ws/mask".into(),
            connect_timeout_ms: 5000,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            translucency: 0.45,
            highlight_color: [255, 0, 0, 255],
            reconnect_delay_ms: 1000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: String::new(),
            snapshot_every: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ViewerConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// WebSocket URL of the mask channel.
    ///
    /// `http` maps to `ws` and `mask_path` is appended to the base path.
    pub fn mask_url(&self) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&self.network.base_url)?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => return Err(ConfigError::TlsUnsupported),
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        url.set_scheme(scheme)
            .map_err(|_| ConfigError::UnsupportedScheme(url.scheme().to_string()))?;

        let mask_path = self.network.mask_path.trim_start_matches('/');
        let path = format!("{}/{}", url.path().trim_end_matches('/'), mask_path);
        url.set_path(&path);
        Ok(url)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.connect_timeout_ms)
    }

    /// Library-side pull channel settings.
    pub fn pull_config(&self) -> PullConfig {
        PullConfig {
            reconnect_delay: Duration::from_millis(self.overlay.reconnect_delay_ms),
            translucency: self.overlay.translucency,
            highlight: HighlightColor::from_rgba(self.overlay.highlight_color),
        }
    }

    /// Snapshot writer, if a snapshot path is configured.
    pub fn snapshot_writer(&self) -> Option<SnapshotWriter> {
        if self.output.snapshot_path.is_empty() {
            return None;
        }
        Some(SnapshotWriter::new(
            PathBuf::from(&self.output.snapshot_path),
            self.output.snapshot_every,
        ))
    }
}

// ── Tests ────────────────────────────────────────────────────────
