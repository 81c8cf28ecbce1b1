//! Wall-clock scheduling for duration-bound actions.
//!
//! All arithmetic uses `tokio::time::Instant`, a monotonic clock that tests
//! can pause and advance deterministically.

use std::time::Duration;
use tokio::time::Instant;

/// Tracks progress of one action against its target duration.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    start: Instant,
    target: Duration,
}

impl Pacer {
    pub fn start(target: Duration) -> Self {
        Self::starting_at(Instant::now(), target)
    }

    pub fn starting_at(start: Instant, target: Duration) -> Self {
        Self { start, target }
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// `max(0, target - elapsed)`.
    pub fn remaining(&self) -> Duration {
        self.target.saturating_sub(self.elapsed())
    }

    /// Time left until `offset` after the start, zero if already past.
    pub fn remaining_until(&self, offset: Duration) -> Duration {
        offset.saturating_sub(self.elapsed())
    }

    pub fn is_done(&self) -> bool {
        self.elapsed() >= self.target
    }

    /// How far past the target the action ran, zero if on time.
    pub fn overrun(&self) -> Duration {
        self.elapsed().saturating_sub(self.target)
    }

    /// Elapsed share of the target, clamped to `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.target.is_zero() {
            return 1.0;
        }
        (self.elapsed().as_secs_f64() / self.target.as_secs_f64()).min(1.0)
    }

    /// Evenly spaced deadlines for emitting `steps` items over the target.
    pub fn schedule(&self, steps: usize) -> StepSchedule {
        StepSchedule {
            pacer: *self,
            steps,
        }
    }
}

/// Deadlines for step `i` are `start + (i + 1) * target / steps`, computed
/// from the fixed start so per-step overhead never accumulates.
#[derive(Debug, Clone, Copy)]
pub struct StepSchedule {
    pacer: Pacer,
    steps: usize,
}

impl StepSchedule {
    pub fn step_delay(&self) -> Duration {
        if self.steps == 0 {
            return Duration::ZERO;
        }
        self.pacer.target.div_f64(self.steps as f64)
    }

    pub fn deadline(&self, step: usize) -> Duration {
        if self.steps == 0 {
            return Duration::ZERO;
        }
        self.pacer
            .target
            .mul_f64((step + 1) as f64 / self.steps as f64)
    }

    /// Time to wait after finishing `step`.
    pub fn wait_after(&self, step: usize) -> Duration {
        self.pacer.remaining_until(self.deadline(step))
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }
}
