//! Mock clocks for deterministic tests.

use chrono::{DateTime, Duration, Utc};
use mingle_core::Clock;
use std::sync::{Arc, Mutex, PoisonError};

/// Fixed clock: always returns the same instant.
///
/// # Example
///
/// ```
/// use mingle_testing::mocks::FixedClock;
/// use mingle_core::Clock;
/// use chrono::Utc;
///
/// let clock = FixedClock::new(Utc::now());
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Creates a fixed clock pinned to the given instant.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// The default fixed clock for tests: 2025-01-01 00:00:00 UTC, matching
/// [`fixtures::BASE_TIME`](crate::fixtures::BASE_TIME).
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(*crate::fixtures::BASE_TIME)
}

/// Clock that a test can advance by hand.
///
/// Clones share the same instant, so the copy held by an engine moves
/// together with the copy held by the test.
#[derive(Clone, Debug)]
pub struct SteppingClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl SteppingClock {
    /// Creates a clock starting at the given instant.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
