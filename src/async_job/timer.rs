//! Timeout tracking for async jobs

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A re-armable timeout
#[derive(Debug, Clone)]
pub struct Timer {
    timeout: Duration,
    started_at: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl Timer {
    /// Create a disarmed timer on the wall clock
    pub fn new(timeout: Duration) -> Self {
        Self::with_clock(timeout, Arc::new(SystemClock))
    }

    /// Create a disarmed timer on the given clock
    pub fn with_clock(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            timeout,
            started_at: None,
            clock,
        }
    }

    /// Arm the timer, restarting it if it was already running
    pub fn start(&mut self) {
        self.started_at = Some(self.clock.now());
    }

    /// Disarm the timer
    pub fn stop(&mut self) {
        self.started_at = None;
    }

    /// Whether the timer is armed
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time since the timer was armed
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at
            .map(|started| self.clock.now().saturating_duration_since(started))
    }

    /// True iff armed and the elapsed time has reached the timeout
    pub fn has_timed_out(&self) -> bool {
        self.elapsed().is_some_and(|elapsed| elapsed >= self.timeout)
    }
}
