//! The counter state holder.
//!
//! [`CounterViewModel`] is what a UI talks to: it dispatches increments and
//! decrements, exposes the current value, and hands out [`CountObserver`]s
//! that wake up whenever the value changes.

use crate::reducer::{CounterEnvironment, CounterReducer};
use crate::repository::CounterRepository;
use crate::store::{CounterStore, InMemoryStore};
use crate::types::{CounterAction, CounterError, CounterState};
use std::sync::Arc;
use std::time::Duration;
use tally_core::environment::Clock;
use tally_runtime::{Store, StoreError};
use tokio::sync::watch;

/// Runtime store specialised for the counter
pub type CounterRuntime = Store<CounterState, CounterAction, CounterEnvironment, CounterReducer>;

/// Holds the counter as observable state and mutates it
#[derive(Clone)]
pub struct CounterViewModel {
    store: CounterRuntime,
}

impl CounterViewModel {
    /// State holder starting at 0 with no repository
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::with_initial(0, clock)
    }

    /// State holder starting at `count` with no repository
    #[must_use]
    pub fn with_initial(count: i64, clock: Arc<dyn Clock>) -> Self {
        let env = CounterEnvironment::new(Arc::new(InMemoryStore), clock);
        Self::from_parts(CounterState::with_count(count), env)
    }

    /// State holder backed by `repository`
    ///
    /// The initial value is whatever the repository currently holds.
    ///
    /// # Errors
    ///
    /// Returns the repository's error if its value cannot be read.
    pub async fn backed_by(
        repository: Arc<dyn CounterRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CounterError> {
        let initial = repository.get_counter().await?.count;
        tracing::debug!(initial, "loaded counter from repository");

        let env = CounterEnvironment::delegating(repository, clock);
        Ok(Self::from_parts(CounterState::with_count(initial), env))
    }

    /// State holder over an explicit store strategy
    ///
    /// Starts at 0; send [`CounterViewModel::reload`] to pull the store's value.
    #[must_use]
    pub fn with_store(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(CounterState::default(), CounterEnvironment::new(store, clock))
    }

    fn from_parts(state: CounterState, env: CounterEnvironment) -> Self {
        tracing::debug!(count = state.count, ?env, "counter view-model created");
        Self {
            store: Store::new(state, CounterReducer::new(), env),
        }
    }

    /// Add one and return the value now held
    ///
    /// With a repository, returns only after the repository has answered and
    /// the held value was re-read from it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`CounterViewModel::shutdown`].
    pub async fn increment(&self) -> Result<i64, StoreError> {
        self.dispatch(CounterAction::Increment).await
    }

    /// Subtract one and return the value now held
    ///
    /// There is no lower bound other than `i64::MIN`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`CounterViewModel::shutdown`].
    pub async fn decrement(&self) -> Result<i64, StoreError> {
        self.dispatch(CounterAction::Decrement).await
    }

    /// Re-read the authoritative value from the store
    ///
    /// Without a repository the held value is authoritative and stays as is.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`CounterViewModel::shutdown`].
    pub async fn reload(&self) -> Result<i64, StoreError> {
        self.dispatch(CounterAction::Load).await
    }

    async fn dispatch(&self, action: CounterAction) -> Result<i64, StoreError> {
        let mut handle = self.store.send(action).await?;
        handle.wait().await;
        Ok(self.count().await)
    }

    /// Current value
    pub async fn count(&self) -> i64 {
        self.store.state(|s| s.count).await
    }

    /// Most recent rejected change, if the last change failed
    pub async fn last_error(&self) -> Option<CounterError> {
        self.store.state(|s| s.last_error.clone()).await
    }

    /// Snapshot of the whole state
    pub async fn snapshot(&self) -> CounterState {
        self.store.state(CounterState::clone).await
    }

    /// Read-only handle that is notified whenever the value changes
    #[must_use]
    pub fn observe(&self) -> CountObserver {
        CountObserver::new(self.store.subscribe_state())
    }

    /// Stop accepting changes and wait for in-flight repository calls
    ///
    /// Results of calls that were already running still reach the held value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if calls are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

impl std::fmt::Debug for CounterViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterViewModel").finish_non_exhaustive()
    }
}

/// Read-reactive view of the counter value
///
/// Values published in quick succession may be coalesced; an observer always
/// catches up to the latest one.
#[derive(Clone, Debug)]
pub struct CountObserver {
    rx: watch::Receiver<CounterState>,
    last: i64,
}

impl CountObserver {
    fn new(rx: watch::Receiver<CounterState>) -> Self {
        let last = rx.borrow().count;
        Self { rx, last }
    }

    /// Latest published value
    #[must_use]
    pub fn current(&self) -> i64 {
        self.rx.borrow().count
    }

    /// Wait for a value different from the one last returned
    ///
    /// Changes to other state fields (such as a recorded error) do not wake
    /// the observer. Returns `None` once every view-model clone is dropped.
    pub async fn changed(&mut self) -> Option<i64> {
        loop {
            let count = self.rx.borrow_and_update().count;
            if count != self.last {
                self.last = count;
                return Some(count);
            }
            self.rx.changed().await.ok()?;
        }
    }
}
