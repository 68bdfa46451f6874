//! # Counter
//!
//! An observable counter state holder.
//!
//! The counter is one signed integer changed only by `increment` and
//! `decrement`. Observers are notified whenever it changes. Where the value
//! lives is a strategy picked at construction time:
//!
//! - [`InMemoryStore`]: the state holder owns the value
//! - [`DelegatingStore`]: a [`CounterRepository`] owns it, and the state
//!   holder re-reads it after every change
//!
//! ## Example
//!
//! ```no_run
//! use counter::{CounterViewModel, InMemoryCounterRepository};
//! use tally_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = InMemoryCounterRepository::with_count(5);
//! let vm = CounterViewModel::backed_by(Arc::new(repo.clone()), Arc::new(SystemClock)).await?;
//!
//! assert_eq!(vm.increment().await?, 6);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reducer;
pub mod repository;
pub mod store;
pub mod types;
pub mod view_model;

// Re-export commonly used types
pub use config::{Backend, CounterConfig};
pub use reducer::{CounterEnvironment, CounterReducer};
pub use repository::{CounterRepository, InMemoryCounterRepository};
pub use store::{CounterStore, DelegatingStore, InMemoryStore, Mutation, Reading};
pub use types::{Counter, CounterAction, CounterError, CounterState, Step};
pub use view_model::{CountObserver, CounterViewModel};
