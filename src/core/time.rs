//! Frame timing utilities

use std::time::{Duration, Instant};

/// Tracks frame timing and calculates FPS
///
/// Owned by the render loop; the first [`tick`](Self::tick) has no previous
/// frame to measure against and reports zero elapsed time.
pub struct FrameTimer {
    last_frame: Option<Instant>,
    fps_timer: Option<Instant>,
    fps: f32,
    fps_frame_count: u32,
}

impl FrameTimer {
    /// Create a new frame timer
    pub fn new() -> Self {
        Self {
            last_frame: None,
            fps_timer: None,
            fps: 0.0,
            fps_frame_count: 0,
        }
    }

    /// Call once per frame; returns seconds elapsed since the previous call
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = match self.last_frame {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_frame = Some(now);
        self.fps_frame_count += 1;

        // Update FPS every second
        let fps_start = *self.fps_timer.get_or_insert(now);
        let fps_elapsed = now.saturating_duration_since(fps_start);
        if fps_elapsed >= Duration::from_secs(1) {
            self.fps = self.fps_frame_count as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = 0;
            self.fps_timer = Some(now);
        }

        delta.as_secs_f32()
    }

    /// Get current FPS (updated every second)
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_zero() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.tick(), 0.0);
        assert!(timer.tick() >= 0.0);
    }

    #[test]
    fn test_delta_between_ticks() {
        let mut timer = FrameTimer::new();
        let start = Instant::now();
        timer.tick_at(start);

        let dt = timer.tick_at(start + Duration::from_millis(250));
        assert!((dt - 0.25).abs() < 1e-6);

        // a clock that steps backwards yields zero, not a negative delta
        assert_eq!(timer.tick_at(start), 0.0);
    }

    #[test]
    fn test_fps_updates_after_one_second() {
        let mut timer = FrameTimer::new();
        let start = Instant::now();
        for i in 0..60 {
            timer.tick_at(start + Duration::from_millis(i * 10));
        }
        assert_eq!(timer.fps(), 0.0);

        timer.tick_at(start + Duration::from_millis(1000));
        assert!((timer.fps() - 61.0).abs() < 0.5, "fps was {}", timer.fps());
    }
}
