//! Clocks and timers
//!
//! Animations never sleep or spawn threads to wait. The host event loop calls
//! `poll()` once per frame; timers compare the clock's current time against
//! their deadlines and report what is due.
//!
//! - [`SystemClock`] reads monotonic wall time
//! - [`ManualClock`] is advanced explicitly, for tests and deterministic replays

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A monotonic time source
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Clock shared between animations and schedulers
pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock time source
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Explicitly advanced clock
///
/// Clones share the same time, so a test can keep one copy and hand another
/// to the animations under test.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, delta: Duration) {
        *self.now.lock() += delta;
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Duration) {
        *self.now.lock() = now;
    }

    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

// ============================================================================
// Timers
// ============================================================================

/// Repeating timer
///
/// Fires at most once per poll. Periods missed while the host was busy are
/// skipped, keeping the original phase.
#[derive(Clone, Debug)]
pub struct PeriodicTimer {
    interval: Duration,
    next_due: Option<Duration>,
}

impl PeriodicTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the period; an armed timer keeps its current deadline
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Start firing one interval from `now`
    pub fn arm(&mut self, now: Duration) {
        self.next_due = Some(now + self.interval);
    }

    pub fn disarm(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.next_due
    }

    /// Returns true if a period elapsed, and schedules the next one
    pub fn fire_due(&mut self, now: Duration) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let behind = (now - due).as_nanos();
        let period = self.interval.as_nanos();
        let phase = if period == 0 { 0 } else { behind % period };
        // phase < period, so the remainder fits back into a Duration
        let until_next = self.interval - Duration::from_nanos(phase as u64);
        self.next_due = Some(now + until_next);
        true
    }
}

/// Cancellable single-shot timer carrying an action
#[derive(Clone)]
pub struct OneShotTimer<T> {
    pending: Option<(Duration, T)>,
}

impl<T> OneShotTimer<T> {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Schedule `action` to fire `delay` after `now`, replacing any pending one
    pub fn schedule(&mut self, now: Duration, delay: Duration, action: T) {
        self.pending = Some((now + delay, action));
    }

    /// Cancel the pending action, returning it
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, action)| action)
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, action)| action)
    }

    pub fn due_at(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    /// Take the action if its deadline has passed
    pub fn take_due(&mut self, now: Duration) -> Option<T> {
        let due = self.due_at()?;
        if due <= now {
            self.cancel()
        } else {
            None
        }
    }
}

impl<T> Default for OneShotTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for OneShotTimer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShotTimer")
            .field("pending", &self.pending)
            .finish()
    }
}
