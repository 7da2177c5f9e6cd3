//! # EchoPass Testing
//!
//! Testing utilities for the EchoPass check-in crates.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, and `MockClock` which tests can advance)
//! - `ReducerTest`, a Given-When-Then builder for reducers
//! - Effect assertion helpers
//!
//! ## Example
//!
//! ```ignore
//! use echopass_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(CheckInReducer::new())
//!     .with_env(test_environment())
//!     .given_state(CheckInState::new(50))
//!     .when_action(CheckInAction::SubmitScan { .. })
//!     .then_effects(|effects| assert_eq!(effects.len(), 1))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use echopass_core::environment::Clock;

mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use echopass_testing::mocks::FixedClock;
    /// use echopass_core::environment::Clock;
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
        /// Create a new fixed clock with the given time
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

    /// Clock that tests move explicitly
    ///
    /// Freshness-window tests need "now" to jump past the window between
    /// encoding a payload and validating it.
    #[derive(Debug)]
    pub struct MockClock {
        millis: AtomicI64,
    }

    impl MockClock {
        /// Create a clock reading the given epoch milliseconds
        #[must_use]
        pub const fn at_millis(millis: i64) -> Self {
            Self {
                millis: AtomicI64::new(millis),
            }
        }

        /// Move the clock forward (or backward, with a negative delta)
        pub fn advance_millis(&self, delta: i64) {
            self.millis.fetch_add(delta, Ordering::SeqCst);
        }

        /// Set the clock to an absolute epoch milliseconds value
        pub fn set_millis(&self, millis: i64) {
            self.millis.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp_millis(self.now_millis()).unwrap_or_default()
        }

        fn now_millis(&self) -> i64 {
            self.millis.load(Ordering::SeqCst)
        }
    }

    /// Epoch milliseconds of 2025-01-01T00:00:00Z, the default test instant
    pub const TEST_EPOCH_MILLIS: i64 = 1_735_689_600_000;

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::from_timestamp_millis(TEST_EPOCH_MILLIS).unwrap_or_default())
    }
}

/// Install a test-friendly tracing subscriber
///
/// Safe to call from every test; only the first call installs it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

pub use mocks::{test_clock, FixedClock, MockClock, TEST_EPOCH_MILLIS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now_millis(), TEST_EPOCH_MILLIS);
    }

    #[test]
    fn test_mock_clock_advances() {
        let clock = MockClock::at_millis(TEST_EPOCH_MILLIS);
        clock.advance_millis(600_000);
        assert_eq!(clock.now_millis(), TEST_EPOCH_MILLIS + 600_000);
        assert_eq!(clock.now().timestamp_millis(), TEST_EPOCH_MILLIS + 600_000);

        clock.set_millis(1);
        assert_eq!(clock.now_millis(), 1);
    }
}
