//! # Tally Testing
//!
//! Testing utilities and helpers for the Tally architecture.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits
//! - [`ReducerTest`], a Given-When-Then builder for reducers
//! - proptest strategies for sequences of counter steps
//!
//! ## Example
//!
//! ```ignore
//! use tally_testing::test_clock;
//! use tally_runtime::Store;
//!
//! #[tokio::test]
//! async fn counts_up() {
//!     let store = Store::new(CounterState::default(), CounterReducer::new(), env(test_clock()));
//!     store.send(CounterAction::Increment).await?;
//!     assert_eq!(store.state(|s| s.count).await, 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use tally_core::environment::Clock;


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_testing::mocks::FixedClock;
    /// use tally_core::environment::Clock;
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

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Direction of a single counter step in a generated sequence
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Direction {
        /// One up
        Up,
        /// One down
        Down,
    }

    impl Direction {
        /// Signed contribution of this step to the final count
        #[must_use]
        pub const fn delta(self) -> i64 {
            match self {
                Self::Up => 1,
                Self::Down => -1,
            }
        }
    }

    /// A single step in either direction
    pub fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Direction::Up), Just(Direction::Down)]
    }

    /// Mixed sequences of up to `max_len` steps
    pub fn directions(max_len: usize) -> impl Strategy<Value = Vec<Direction>> {
        prop::collection::vec(direction(), 0..=max_len)
    }

    /// Starting counts far enough from the `i64` limits that `margin` steps
    /// in either direction never overflow
    pub fn start_value(margin: i64) -> impl Strategy<Value = i64> {
        (i64::MIN + margin)..=(i64::MAX - margin)
    }

    /// Net effect of a step sequence
    #[must_use]
    pub fn net(steps: &[Direction]) -> i64 {
        steps.iter().map(|step| step.delta()).sum()
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
