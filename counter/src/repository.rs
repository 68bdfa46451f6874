//! Counter repository: the single source of truth for the counter value.
//!
//! Object safe so the [`DelegatingStore`](crate::store::DelegatingStore)
//! can hold any backend behind `Arc<dyn CounterRepository>`.

use crate::types::{Counter, CounterError, Step};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, CounterError>;

/// Boxed future returned by repository methods
pub type RepositoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Owns the authoritative counter value.
///
/// No concurrency guarantees beyond those of the implementation; callers
/// reading after a mutation see that mutation.
pub trait CounterRepository: Send + Sync {
    /// Current stored value.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Repository`] if the value cannot be read.
    fn get_counter(&self) -> RepositoryFuture<'_, Counter>;

    /// Add one to the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Overflow`] at `i64::MAX`, or
    /// [`CounterError::Repository`] if the value cannot be written.
    fn increment_counter(&self) -> RepositoryFuture<'_, ()>;

    /// Subtract one from the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Underflow`] at `i64::MIN`, or
    /// [`CounterError::Repository`] if the value cannot be written.
    fn decrement_counter(&self) -> RepositoryFuture<'_, ()>;
}

/// In-memory repository.
///
/// Clones share the same value.
///
/// # Example
///
/// ```
/// use counter::{CounterRepository, InMemoryCounterRepository};
///
/// # async fn example() -> Result<(), counter::CounterError> {
/// let repo = InMemoryCounterRepository::with_count(5);
/// repo.increment_counter().await?;
/// assert_eq!(repo.get_counter().await?.count, 6);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryCounterRepository {
    count: Arc<RwLock<i64>>,
}

impl InMemoryCounterRepository {
    /// Repository starting at 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository starting at `count`
    #[must_use]
    pub fn with_count(count: i64) -> Self {
        Self {
            count: Arc::new(RwLock::new(count)),
        }
    }

    fn read(&self) -> Result<i64> {
        self.count
            .read()
            .map(|count| *count)
            .map_err(|e| CounterError::Repository(format!("lock poisoned: {e}")))
    }

    fn step(&self, step: Step) -> Result<()> {
        let mut count = self
            .count
            .write()
            .map_err(|e| CounterError::Repository(format!("lock poisoned: {e}")))?;
        *count = step.apply(*count)?;
        tracing::trace!(step = step.as_str(), count = *count, "repository updated");
        Ok(())
    }
}

impl CounterRepository for InMemoryCounterRepository {
    fn get_counter(&self) -> RepositoryFuture<'_, Counter> {
        let result = self.read().map(Counter::new);
        Box::pin(async move { result })
    }

    fn increment_counter(&self) -> RepositoryFuture<'_, ()> {
        let result = self.step(Step::Up);
        Box::pin(async move { result })
    }

    fn decrement_counter(&self) -> RepositoryFuture<'_, ()> {
        let result = self.step(Step::Down);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_at_zero() {
        let repo = InMemoryCounterRepository::new();
        assert_eq!(repo.get_counter().await.unwrap(), Counter::new(0));
    }

    #[tokio::test]
    async fn increments_and_decrements() {
        let repo = InMemoryCounterRepository::with_count(5);

        repo.increment_counter().await.unwrap();
        assert_eq!(repo.get_counter().await.unwrap().count, 6);

        repo.decrement_counter().await.unwrap();
        repo.decrement_counter().await.unwrap();
        assert_eq!(repo.get_counter().await.unwrap().count, 4);
    }

    #[tokio::test]
    async fn clones_share_value() {
        let repo = InMemoryCounterRepository::new();
        let other = repo.clone();

        other.increment_counter().await.unwrap();

        assert_eq!(repo.get_counter().await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn overflow_leaves_value_unchanged() {
        let repo = InMemoryCounterRepository::with_count(i64::MAX);

        let err = repo.increment_counter().await.unwrap_err();

        assert_eq!(err, CounterError::Overflow { count: i64::MAX });
        assert_eq!(repo.get_counter().await.unwrap().count, i64::MAX);
    }
}
