//! Delivered-frames-per-second meter.
//!
//! Counts frames over a tumbling window (1 s by default). When a
//! recorded frame closes the window, one FPS sample is emitted and the
//! window restarts at that frame's timestamp.

use std::time::{Duration, Instant};

/// Tumbling-window frame rate meter.
#[derive(Debug, Clone)]
pub struct RateMeter {
    /// Frames recorded in the current window.
    frame_count: u32,
    /// Start of the current window.
    window_start: Instant,
    /// Window duration.
    window: Duration,
    /// Most recently emitted sample.
    last_fps: Option<u32>,
}

impl RateMeter {
    /// Create a 1-second meter whose first window starts at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self::with_window(start, Duration::from_secs(1))
    }

    /// Create a meter with a custom window duration.
    pub fn with_window(start: Instant, window: Duration) -> Self {
        Self {
            frame_count: 0,
            window_start: start,
            window,
            last_fps: None,
        }
    }

    /// Record one delivered frame at `now`.
    ///
    /// Returns the new FPS sample if this frame closed the window.
    pub fn record_at(&mut self, now: Instant) -> Option<u32> {
        self.frame_count += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let fps = (f64::from(self.frame_count) * 1000.0 / elapsed_ms).round() as u32;
        tracing::trace!(fps, frames = self.frame_count, "fps window closed");

        self.frame_count = 0;
        self.window_start = now;
        self.last_fps = Some(fps);
        Some(fps)
    }

    /// Last emitted sample, `None` until the first window closes.
    pub fn last_fps(&self) -> Option<u32> {
        self.last_fps
    }

    /// Frames recorded in the still-open window.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }
}

/// Render an optional FPS sample for a status line.
pub fn fps_label(fps: Option<u32>) -> String {
    match fps {
        Some(fps) => fps.to_string(),
        None => "--".to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_before_first_window() {
        let meter = RateMeter::starting_at(Instant::now());
        assert_eq!(meter.last_fps(), None);
        assert_eq!(fps_label(meter.last_fps()), "--");
    }

    #[test]
    fn thirty_frames_over_one_second() {
        let t0 = Instant::now();
        let mut meter = RateMeter::starting_at(t0);
        let step = Duration::from_micros(33_334);

        let mut emitted = Vec::new();
        for i in 1..=30 {
            if let Some(fps) = meter.record_at(t0 + step * i) {
                emitted.push(fps);
            }
        }

        assert_eq!(emitted, vec![30]);
        assert_eq!(meter.frame_count(), 0);
        assert_eq!(meter.last_fps(), Some(30));
        assert_eq!(fps_label(meter.last_fps()), "30");
    }

    #[test]
    fn no_sample_inside_window() {
        let t0 = Instant::now();
        let mut meter = RateMeter::starting_at(t0);
        for i in 1..=10 {
            assert!(meter.record_at(t0 + Duration::from_millis(90 * i)).is_none());
        }
        assert_eq!(meter.frame_count(), 10);
    }

    #[test]
    fn slow_stream_rounds() {
        let t0 = Instant::now();
        let mut meter = RateMeter::starting_at(t0);
        meter.record_at(t0 + Duration::from_millis(700));
        // 2 frames over 1400 ms ≈ 1.43 fps
        let fps = meter.record_at(t0 + Duration::from_millis(1400));
        assert_eq!(fps, Some(1));
    }

    #[test]
    fn window_restarts_at_emitting_frame() {
        let t0 = Instant::now();
        let mut meter = RateMeter::starting_at(t0);
        let t1 = t0 + Duration::from_millis(1000);
        assert_eq!(meter.record_at(t1), Some(1));

        assert!(meter.record_at(t1 + Duration::from_millis(500)).is_none());
        assert_eq!(meter.record_at(t1 + Duration::from_millis(1000)), Some(2));
    }
}
