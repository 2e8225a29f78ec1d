/// Wave motion: a linear tween that yoyos forever until cancelled.
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Tween {
    dx: f32,
    dy: f32,
    duration: Duration,
    started_at: Instant,
    cancelled: bool,
}

impl Tween {
    /// Start moving by `(dx, dy)` over `duration`, then back, repeating.
    pub fn yoyo(dx: f32, dy: f32, duration: Duration, started_at: Instant) -> Self {
        Tween {
            dx,
            dy,
            duration,
            started_at,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Displacement at `now`, or `None` once cancelled.
    pub fn sample(&self, now: Instant) -> Option<(f32, f32)> {
        if self.cancelled {
            return None;
        }
        let t = self.progress(now);
        Some((self.dx * t, self.dy * t))
    }

    /// 0 → 1 on the outbound leg, 1 → 0 on the way back.
    fn progress(&self, now: Instant) -> f32 {
        let period = self.duration.as_secs_f32();
        if period <= 0.0 {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f32();
        let phase = (elapsed / period) % 2.0;
        if phase <= 1.0 {
            phase
        } else {
            2.0 - phase
        }
    }
}
