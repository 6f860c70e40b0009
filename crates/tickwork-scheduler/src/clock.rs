//! Wall-clock source for the engine and the shared state.

use chrono::{DateTime, Utc};

/// Source of "now". The engine converts the gap between `now()` and the next
/// fire instant into a tokio sleep, so any implementation must advance in
/// step with tokio's timer.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// The real UTC wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock derived from tokio's monotonic timer: `base` plus the tokio time
/// elapsed since construction.
///
/// Under a paused runtime (`#[tokio::test(start_paused = true)]`) this clock
/// only moves when tokio auto-advances, which makes cadence scenarios exact.
#[derive(Debug, Clone)]
pub struct TokioClock {
    base: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Must be called from inside a tokio runtime.
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now().duration_since(self.origin);
        match chrono::Duration::from_std(elapsed) {
            Ok(elapsed) => self.base + elapsed,
            Err(_) => self.base,
        }
    }
}
