//! Status line and snapshot output for the viewer.
//!
//! The viewer is headless: connection health and FPS go to the log,
//! and the composited overlay can be written out as a PNG every N
//! frames for inspection or for an external display to pick up.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use ultrasafe_core::ViewerStats;

/// One-line status summary, e.g. `FPS: 24 · WS: connected`.
pub fn status_line(stats: &ViewerStats) -> String {
    format!("FPS: {} · WS: {}", stats.fps_label(), stats.state)
}

/// Writes every Nth composited frame to a PNG file.
#[derive(Debug)]
pub struct SnapshotWriter {
    path: PathBuf,
    every: u32,
    seen: u64,
}

impl SnapshotWriter {
    /// `every == 0` is treated as 1.
    pub fn new(path: PathBuf, every: u32) -> Self {
        Self {
            path,
            every: every.max(1),
            seen: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count a composited frame and write it if it is due.
    ///
    /// Returns `Ok(true)` when the file was written.
    pub fn offer(&mut self, frame: &RgbaImage) -> Result<bool, image::ImageError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(false);
        }
        self.seen += 1;
        if self.seen % u64::from(self.every) != 0 {
            return Ok(false);
        }
        frame.save_with_format(&self.path, ImageFormat::Png)?;
        Ok(true)
    }
}

// ── Tests ────────────────────────────────────────────────────────
