//! Reducer logic for the counter.
//!
//! Local stores change the count inside the reducer. Delegating stores do
//! not: the reducer returns an effect that talks to the repository and the
//! count changes only when `Synced` comes back.

use crate::repository::CounterRepository;
use crate::store::{CounterStore, DelegatingStore, InMemoryStore, Mutation, Reading};
use crate::types::{CounterAction, CounterError, CounterState, Step};
use std::sync::Arc;
use tally_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};

/// Environment dependencies for the counter reducer
#[derive(Clone)]
pub struct CounterEnvironment {
    /// Clock for `updated_at` timestamps
    pub clock: Arc<dyn Clock>,
    /// Where the value lives
    pub store: Arc<dyn CounterStore>,
}

impl CounterEnvironment {
    /// Environment with an explicit store strategy
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self { clock, store }
    }

    /// Environment whose value lives only in the state holder
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(InMemoryStore), clock)
    }

    /// Environment backed by `repository`
    #[must_use]
    pub fn delegating(repository: Arc<dyn CounterRepository>, clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(DelegatingStore::new(repository)), clock)
    }
}

impl std::fmt::Debug for CounterEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterEnvironment")
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

/// Counter reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct CounterReducer;

impl CounterReducer {
    /// Creates a new `CounterReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn step(
        state: &mut CounterState,
        step: Step,
        env: &CounterEnvironment,
    ) -> SmallVec<[Effect<CounterAction>; 4]> {
        metrics::counter!("counter.mutations", "step" => step.as_str()).increment(1);

        match env.store.mutate(step, state.count) {
            Ok(Mutation::Applied(count)) => {
                tracing::debug!(step = step.as_str(), from = state.count, to = count, "counter changed");
                Self::settle(state, count, env);
                smallvec![Effect::None]
            },
            Ok(Mutation::Pending(fut)) => {
                tracing::debug!(step = step.as_str(), store = env.store.name(), "delegating to store");
                smallvec![Self::sync(fut)]
            },
            Err(error) => {
                tracing::warn!(step = step.as_str(), count = state.count, %error, "counter change rejected");
                state.last_error = Some(error);
                smallvec![Effect::None]
            },
        }
    }

    /// Effect that resolves a store reading into `Synced` or `SyncFailed`
    fn sync<F>(fut: F) -> Effect<CounterAction>
    where
        F: std::future::Future<Output = Result<Reading, CounterError>> + Send + 'static,
    {
        Effect::future(async move {
            Some(match fut.await {
                Ok(Reading { count, revision }) => CounterAction::Synced { count, revision },
                Err(error) => CounterAction::SyncFailed { error },
            })
        })
    }

    fn settle(state: &mut CounterState, count: i64, env: &CounterEnvironment) {
        if state.count != count {
            state.count = count;
            state.updated_at = Some(env.clock.now());
        }
        state.last_error = None;
    }
}

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;
    type Environment = CounterEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CounterAction::Increment => Self::step(state, Step::Up, env),
            CounterAction::Decrement => Self::step(state, Step::Down, env),
            CounterAction::Load => match env.store.load() {
                Some(fut) => smallvec![Self::sync(fut)],
                None => {
                    tracing::debug!(count = state.count, "held value is authoritative, nothing to load");
                    smallvec![Effect::None]
                },
            },
            CounterAction::Synced { count, revision } => {
                if revision <= state.revision {
                    tracing::debug!(revision, applied = state.revision, "dropping stale store reading");
                    return smallvec![Effect::None];
                }
                tracing::debug!(from = state.count, to = count, revision, "counter synced from store");
                state.revision = revision;
                Self::settle(state, count, env);
                smallvec![Effect::None]
            },
            CounterAction::SyncFailed { error } => {
                tracing::warn!(%error, store = env.store.name(), "store request failed");
                state.last_error = Some(error);
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCounterRepository;
    use tally_testing::{ReducerTest, assertions, test_clock};

    fn in_memory_env() -> CounterEnvironment {
        CounterEnvironment::in_memory(Arc::new(test_clock()))
    }

    fn delegating_env(count: i64) -> CounterEnvironment {
        CounterEnvironment::delegating(
            Arc::new(InMemoryCounterRepository::with_count(count)),
            Arc::new(test_clock()),
        )
    }

    #[test]
    fn test_increment() {
        ReducerTest::new(CounterReducer::new())
            .with_env(in_memory_env())
            .given_state(CounterState::default())
            .when_action(CounterAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
                assert_eq!(state.updated_at, Some(test_clock().now()));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_decrement_below_zero() {
        ReducerTest::new(CounterReducer::new())
            .with_env(in_memory_env())
            .given_state(CounterState::default())
            .when_action(CounterAction::Decrement)
            .then_state(|state| assert_eq!(state.count, -1))
            .run();
    }

    #[test]
    fn test_three_increments() {
        ReducerTest::new(CounterReducer::new())
            .with_env(in_memory_env())
            .given_state(CounterState::default())
            .when_actions([
                CounterAction::Increment,
                CounterAction::Increment,
                CounterAction::Increment,
            ])
            .then_state(|state| assert_eq!(state.count, 3))
            .run();
    }

    #[test]
    fn test_interleaved() {
        ReducerTest::new(CounterReducer::new())
            .with_env(in_memory_env())
            .given_state(CounterState::default())
            .when_actions([
                CounterAction::Increment,
                CounterAction::Decrement,
                CounterAction::Increment,
            ])
            .then_state(|state| assert_eq!(state.count, 1))
            .run();
    }

    #[test]
    fn test_overflow_is_rejected() {
        ReducerTest::new(CounterReducer::new())
            .with_env(in_memory_env())
            .given_state(CounterState::with_count(i64::MAX))
            .when_action(CounterAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, i64::MAX);
                assert_eq!(
                    state.last_error,
                    Some(CounterError::Overflow { count: i64::MAX })
                );
                assert!(state.updated_at.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_success_clears_last_error() {
        ReducerTest::new(CounterReducer::new())
            .with_env(in_memory_env())
            .given_state(CounterState::with_count(i64::MAX))
            .when_actions([CounterAction::Increment, CounterAction::Decrement])
            .then_state(|state| {
                assert_eq!(state.count, i64::MAX - 1);
                assert!(state.last_error.is_none());
            })
            .run();
    }

    #[test]
    fn test_delegating_increment_waits_for_repository() {
        ReducerTest::new(CounterReducer::new())
            .with_env(delegating_env(5))
            .given_state(CounterState::with_count(5))
            .when_action(CounterAction::Increment)
            .then_state(|state| assert_eq!(state.count, 5))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_synced_overwrites_local_value() {
        ReducerTest::new(CounterReducer::new())
            .with_env(delegating_env(0))
            .given_state(CounterState::with_count(5))
            .when_action(CounterAction::Synced { count: 6, revision: 1 })
            .then_state(|state| {
                assert_eq!(state.count, 6);
                assert_eq!(state.revision, 1);
                assert!(state.updated_at.is_some());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_stale_reading_is_dropped() {
        ReducerTest::new(CounterReducer::new())
            .with_env(delegating_env(0))
            .given_state(CounterState::default())
            .when_actions([
                CounterAction::Synced { count: 2, revision: 2 },
                CounterAction::Synced { count: 1, revision: 1 },
            ])
            .then_state(|state| {
                assert_eq!(state.count, 2);
                assert_eq!(state.revision, 2);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_sync_failed_keeps_value() {
        let error = CounterError::Repository("unreachable".into());
        let expected = error.clone();

        ReducerTest::new(CounterReducer::new())
            .with_env(delegating_env(0))
            .given_state(CounterState::with_count(2))
            .when_action(CounterAction::SyncFailed { error })
            .then_state(move |state| {
                assert_eq!(state.count, 2);
                assert_eq!(state.last_error, Some(expected));
            })
            .run();
    }

    #[test]
    fn test_load_keeps_in_memory_value() {
        ReducerTest::new(CounterReducer::new())
            .with_env(in_memory_env())
            .given_state(CounterState::with_count(8))
            .when_action(CounterAction::Load)
            .then_state(|state| assert_eq!(state.count, 8))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_load_from_repository_produces_future() {
        ReducerTest::new(CounterReducer::new())
            .with_env(delegating_env(3))
            .given_state(CounterState::default())
            .when_action(CounterAction::Load)
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }
}
