//! Host deadline contract
//!
//! The host environment owns the notion of "time left in this turn". It
//! calls [`RenderSession::tick`](crate::RenderSession::tick) from its idle
//! mechanism with a fresh deadline each turn, and re-registers for another
//! turn while the tick reports
//! [`TickStatus::Pending`](crate::TickStatus::Pending). The engine only ever
//! queries remaining time; it never sleeps or spawns.

use std::time::{Duration, Instant};

/// Time-remaining oracle for one scheduler turn
pub trait Deadline {
    /// How much of the current turn's budget is left
    fn time_remaining(&self) -> Duration;
}

/// Deadline that never expires; drains a whole pass in one turn
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconstrained;

impl Deadline for Unconstrained {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Wall-clock budget measured from construction
///
/// ```
/// use std::time::Duration;
/// use runtime::{Deadline, TimeSlice};
///
/// let slice = TimeSlice::new(Duration::from_millis(4));
/// assert!(slice.time_remaining() <= Duration::from_millis(4));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    start: Instant,
    budget: Duration,
}

impl TimeSlice {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }
}

impl Deadline for TimeSlice {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Deadline that always reports zero remaining time
///
/// Forces the scheduler down to one unit of work per tick; useful for hosts
/// that want maximum interleaving and for exercising resume paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhausted;

impl Deadline for Exhausted {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}
