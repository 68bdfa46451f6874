//! Where the counter value lives.
//!
//! A [`CounterStore`] is chosen once, when the environment is built:
//!
//! - [`InMemoryStore`]: the state holder's own value is authoritative.
//! - [`DelegatingStore`]: a [`CounterRepository`] is authoritative; after
//!   every mutation the value is read back from it.

use crate::repository::CounterRepository;
use crate::types::{CounterError, Step};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A value read back from the authoritative store
///
/// Revisions grow by one per successful read. A reading with a lower revision
/// than one already applied is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    /// Authoritative count
    pub count: i64,
    /// Position of this read in the store's history
    pub revision: u64,
}

/// Boxed future resolving to an authoritative reading
pub type ReadingFuture = Pin<Box<dyn Future<Output = Result<Reading, CounterError>> + Send>>;

/// Outcome of asking a store to apply a [`Step`]
pub enum Mutation {
    /// The new value is known right away
    Applied(i64),
    /// The new value arrives once the backing repository answers
    Pending(ReadingFuture),
}

impl std::fmt::Debug for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied(count) => f.debug_tuple("Mutation::Applied").field(count).finish(),
            Self::Pending(_) => write!(f, "Mutation::Pending(<future>)"),
        }
    }
}

/// Storage strategy for the counter
pub trait CounterStore: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Read the authoritative value
    ///
    /// `None` when the state holder's own value is the authoritative one.
    fn load(&self) -> Option<ReadingFuture>;

    /// Apply `step` given the value the state holder currently shows
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Overflow`] or [`CounterError::Underflow`] when a
    /// synchronous store cannot apply the step.
    fn mutate(&self, step: Step, current: i64) -> Result<Mutation, CounterError>;
}

/// The state holder's value is the only copy
#[derive(Clone, Copy, Debug, Default)]
pub struct InMemoryStore;

impl CounterStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    fn load(&self) -> Option<ReadingFuture> {
        None
    }

    fn mutate(&self, step: Step, current: i64) -> Result<Mutation, CounterError> {
        step.apply(current).map(Mutation::Applied)
    }
}

/// Forwards every mutation to a [`CounterRepository`]
///
/// Round trips are serialised: a step and its read-back run under one lock,
/// so revisions follow the order in which the repository changed.
#[derive(Clone)]
pub struct DelegatingStore {
    repository: Arc<dyn CounterRepository>,
    revision: Arc<Mutex<u64>>,
}

impl DelegatingStore {
    /// Delegate to `repository`
    #[must_use]
    pub fn new(repository: Arc<dyn CounterRepository>) -> Self {
        Self {
            repository,
            revision: Arc::new(Mutex::new(0)),
        }
    }
}

impl std::fmt::Debug for DelegatingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatingStore").finish_non_exhaustive()
    }
}

impl CounterStore for DelegatingStore {
    fn name(&self) -> &'static str {
        "delegating"
    }

    fn load(&self) -> Option<ReadingFuture> {
        Some(Box::pin(round_trip(
            Arc::clone(&self.repository),
            Arc::clone(&self.revision),
            None,
        )))
    }

    fn mutate(&self, step: Step, _current: i64) -> Result<Mutation, CounterError> {
        Ok(Mutation::Pending(Box::pin(round_trip(
            Arc::clone(&self.repository),
            Arc::clone(&self.revision),
            Some(step),
        ))))
    }
}

/// Optionally apply `step`, then read the repository's value back
async fn round_trip(
    repository: Arc<dyn CounterRepository>,
    revision: Arc<Mutex<u64>>,
    step: Option<Step>,
) -> Result<Reading, CounterError> {
    let mut revision = revision.lock().await;

    match step {
        Some(Step::Up) => repository.increment_counter().await?,
        Some(Step::Down) => repository.decrement_counter().await?,
        None => {},
    }
    // The repository's value wins over anything computed locally.
    let count = repository.get_counter().await?.count;

    *revision += 1;
    Ok(Reading {
        count,
        revision: *revision,
    })
}
