/// Time source for the dispatch core.
///
/// Timestamps are durations since an arbitrary per-clock epoch. Only their
/// ordering matters: a queue compares `now` against a command's scheduled
/// time and nothing else.

use std::ops::Add;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A point on a monotonic clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(Duration);

impl Timestamp {
    /// The clock epoch
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_duration(since_epoch: Duration) -> Self {
        Self(since_epoch)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Negative and NaN inputs clamp to zero, overflow clamps to `Duration::MAX`
    pub fn from_secs_f64(secs: f64) -> Self {
        match Duration::try_from_secs_f64(secs) {
            Ok(duration) => Self(duration),
            Err(_) if secs > 0.0 => Self(Duration::MAX),
            Err(_) => Self::ZERO,
        }
    }

    /// Time elapsed since the clock epoch
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_millis(&self) -> u128 {
        self.0.as_millis()
    }

    /// Time from `earlier` to `self`, or zero if `earlier` is later
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

/// Monotonic time provider injected into queues and the engine
pub trait Clock: Send + Sync {
    /// Current time. Must never go backwards.
    fn now(&self) -> Timestamp;
}

/// Wall-clock backed monotonic clock (epoch = construction time)
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.epoch.elapsed())
    }
}

/// Manually driven clock for fixed-step loops and tests.
///
/// Time only moves when `advance` or `set` is called. `set` refuses to move
/// backwards to keep the clock monotonic.
#[derive(Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { nanos: AtomicU64::new(0) }
    }

    /// Create a clock already positioned at `start`
    pub fn starting_at(start: Timestamp) -> Self {
        Self { nanos: AtomicU64::new(Self::to_nanos(start.as_duration())) }
    }

    /// Move the clock forward by `delta` and return the new time
    pub fn advance(&self, delta: Duration) -> Timestamp {
        let delta = Self::to_nanos(delta);
        let previous = self.nanos.fetch_add(delta, Ordering::AcqRel);
        Timestamp(Duration::from_nanos(previous.saturating_add(delta)))
    }

    /// Jump to `time`. Earlier times are ignored.
    pub fn set(&self, time: Timestamp) {
        self.nanos.fetch_max(Self::to_nanos(time.as_duration()), Ordering::AcqRel);
    }

    fn to_nanos(duration: Duration) -> u64 {
        u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(Duration::from_nanos(self.nanos.load(Ordering::Acquire)))
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
