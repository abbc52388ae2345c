//! Frame rate meter for the toolbar

use std::collections::VecDeque;
use std::time::Instant;

/// Number of frame timestamps kept, and how often the rate is recomputed
pub const FRAME_WINDOW: usize = 100;

/// Average frame rate over the last [`FRAME_WINDOW`] frames.
///
/// The displayed value only changes once every `FRAME_WINDOW` frames, so the
/// text stays readable.
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    timestamps: VecDeque<Instant>,
    frames: usize,
    fps: Option<f64>,
}

impl FrameRateMeter {
    pub fn new() -> Self {
        Self {
            timestamps: VecDeque::with_capacity(FRAME_WINDOW),
            frames: 0,
            fps: None,
        }
    }

    /// Record a rendered frame; returns the new rate when it was recomputed
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        if self.timestamps.len() == FRAME_WINDOW {
            self.timestamps.pop_front();
        }
        self.timestamps.push_back(now);
        self.frames += 1;

        if self.frames % FRAME_WINDOW != 0 {
            return None;
        }
        let (oldest, newest) = (self.timestamps.front()?, self.timestamps.back()?);
        let span = newest.saturating_duration_since(*oldest).as_secs_f64();
        if span <= 0.0 {
            return None;
        }
        let fps = (FRAME_WINDOW - 1) as f64 / span;
        self.fps = Some(fps);
        Some(fps)
    }

    pub fn fps(&self) -> Option<f64> {
        self.fps
    }

    /// Rate with three decimals, empty until the first window completes
    pub fn text(&self) -> String {
        self.fps.map(|fps| format!("{:.3}", fps)).unwrap_or_default()
    }
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn feed(meter: &mut FrameRateMeter, start: Instant, frames: std::ops::Range<u32>, step: Duration) -> Vec<f64> {
        frames.filter_map(|i| meter.record(start + step * i)).collect()
    }

    #[test]
    fn test_recomputed_every_window() {
        let mut meter = FrameRateMeter::new();
        let start = Instant::now();
        let step = Duration::from_millis(20);

        assert!(feed(&mut meter, start, 0..99, step).is_empty());
        assert_eq!(meter.text(), "");

        let rates = feed(&mut meter, start, 99..100, step);
        assert_eq!(rates.len(), 1);
        assert_relative_eq!(rates[0], 50.0, epsilon = 1e-6);
        assert_eq!(meter.text(), "50.000");
    }

    #[test]
    fn test_rate_tracks_recent_frames() {
        let mut meter = FrameRateMeter::new();
        let start = Instant::now();
        feed(&mut meter, start, 0..100, Duration::from_millis(20));

        // next window at 100 fps, held until the 200th frame
        let later = start + Duration::from_secs(10);
        let rates = feed(&mut meter, later, 0..100, Duration::from_millis(10));
        assert_eq!(rates.len(), 1);
        assert_relative_eq!(rates[0], 100.0, epsilon = 1e-6);
        assert_eq!(meter.text(), "100.000");
    }

    #[test]
    fn test_identical_timestamps_are_ignored() {
        let mut meter = FrameRateMeter::new();
        let now = Instant::now();
        for _ in 0..FRAME_WINDOW {
            meter.record(now);
        }
        assert_eq!(meter.fps(), None);
    }
}
