//! Domain types for the counter.
//!
//! The counter is a single signed integer. It may go negative; the only
//! rejected transitions are those that would leave the `i64` range.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The value held by a [`CounterRepository`](crate::repository::CounterRepository)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counter {
    /// Current count
    pub count: i64,
}

impl Counter {
    /// Creates a counter holding `count`
    #[must_use]
    pub const fn new(count: i64) -> Self {
        Self { count }
    }
}

/// One unit of change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Add one
    Up,
    /// Subtract one
    Down,
}

impl Step {
    /// Applies the step to `count`
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Overflow`] or [`CounterError::Underflow`] when
    /// the result would leave the `i64` range.
    pub fn apply(self, count: i64) -> Result<i64, CounterError> {
        match self {
            Self::Up => count
                .checked_add(1)
                .ok_or(CounterError::Overflow { count }),
            Self::Down => count
                .checked_sub(1)
                .ok_or(CounterError::Underflow { count }),
        }
    }

    /// Label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "increment",
            Self::Down => "decrement",
        }
    }
}

/// Errors raised while changing or reading the counter
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum CounterError {
    /// Incrementing would exceed `i64::MAX`
    #[error("counter overflow: cannot increment past {count}")]
    Overflow {
        /// Value at the time of the attempt
        count: i64,
    },

    /// Decrementing would go below `i64::MIN`
    #[error("counter underflow: cannot decrement past {count}")]
    Underflow {
        /// Value at the time of the attempt
        count: i64,
    },

    /// The backing repository failed
    #[error("repository error: {0}")]
    Repository(String),
}

/// State observed by the UI
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterState {
    /// Current count value
    pub count: i64,
    /// Most recent rejected change, cleared by the next successful one
    pub last_error: Option<CounterError>,
    /// When the count last changed
    pub updated_at: Option<DateTime<Utc>>,
    /// Revision of the last store reading applied; older readings are dropped
    pub revision: u64,
}

impl CounterState {
    /// State starting at `count`
    #[must_use]
    pub const fn with_count(count: i64) -> Self {
        Self {
            count,
            last_error: None,
            updated_at: None,
            revision: 0,
        }
    }
}

/// Counter actions
///
/// `Increment` and `Decrement` come from the UI. `Load`, `Synced` and
/// `SyncFailed` carry values to and from the backing store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CounterAction {
    /// Increment the counter by 1
    Increment,
    /// Decrement the counter by 1
    Decrement,
    /// Re-read the authoritative value from the store
    Load,
    /// The store reported its current value
    Synced {
        /// Authoritative count
        count: i64,
        /// Store revision the count was read at
        revision: u64,
    },
    /// The store could not complete a request
    SyncFailed {
        /// What went wrong
        error: CounterError,
    },
}
