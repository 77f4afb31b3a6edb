use std::time::{Duration, Instant};

/// Frames-per-second measurement over one reporting window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FpsSample {
    pub fps: f64,
    pub frames: u64,
    pub elapsed: Duration,
}

/// Accumulates frame ticks and yields a sample once per reporting window.
///
/// Time is passed in rather than read from the clock so the counter stays
/// deterministic under test.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: Duration,
    last: Option<Instant>,
    elapsed: Duration,
    frames: u64,
    total_frames: u64,
}

impl FpsCounter {
    /// Creates a counter reporting once per wall-clock second.
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> Self {
        debug_assert!(!window.is_zero());
        Self {
            window,
            last: None,
            elapsed: Duration::ZERO,
            frames: 0,
            total_frames: 0,
        }
    }

    /// Frames counted since creation.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Forgets the time baseline, e.g. after a long stall such as a resize.
    pub fn reset(&mut self) {
        self.last = None;
        self.elapsed = Duration::ZERO;
        self.frames = 0;
    }

    /// Counts one frame at `now`.
    ///
    /// Returns a sample when the accumulated time crosses the window; the
    /// accumulator then restarts with the remainder.
    pub fn tick(&mut self, now: Instant) -> Option<FpsSample> {
        self.total_frames += 1;
        self.frames += 1;

        // The first tick only establishes the baseline.
        let last = self.last.replace(now)?;

        self.elapsed += now.saturating_duration_since(last);
        if self.elapsed < self.window {
            return None;
        }

        let sample = FpsSample {
            fps: self.frames as f64 / self.elapsed.as_secs_f64(),
            frames: self.frames,
            elapsed: self.elapsed,
        };

        self.frames = 0;
        self.elapsed -= self.window;

        Some(sample)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn first_tick_never_reports() {
        let mut c = FpsCounter::new();
        assert!(c.tick(Instant::now()).is_none());
        assert_eq!(c.total_frames(), 1);
    }

    #[test]
    fn reports_once_per_window() {
        let t0 = Instant::now();
        let mut c = FpsCounter::new();
        let mut samples = Vec::new();

        // 10ms frames for 2.5 seconds.
        for i in 0..=250 {
            if let Some(s) = c.tick(t0 + ms(10 * i)) {
                samples.push(s);
            }
        }

        assert_eq!(samples.len(), 2);
        let first = samples[0];
        assert_eq!(first.elapsed, ms(1000));
        assert!((first.fps - 101.0).abs() < 1e-9, "fps = {}", first.fps);
    }

    #[test]
    fn slow_frames_report_every_tick() {
        let t0 = Instant::now();
        let mut c = FpsCounter::new();
        c.tick(t0);

        let s = c.tick(t0 + ms(1500)).unwrap();
        assert_eq!(s.frames, 2);
        assert!(c.tick(t0 + ms(2000)).is_some());
    }

    #[test]
    fn reset_drops_the_baseline() {
        let t0 = Instant::now();
        let mut c = FpsCounter::new();
        c.tick(t0);
        c.reset();

        assert!(c.tick(t0 + ms(5000)).is_none());
        assert_eq!(c.total_frames(), 2);
    }
}
