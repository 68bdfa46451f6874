//! Counter demo binary
//!
//! Runs the counter through a few increments and decrements while an
//! observer task prints every change.

use counter::{
    Backend, CounterConfig, CounterRepository, CounterViewModel, InMemoryCounterRepository,
};
use std::sync::Arc;
use tally_core::environment::{Clock, SystemClock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=debug,tally_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CounterConfig::from_env();
    tracing::info!(?config, "starting counter");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repository = InMemoryCounterRepository::with_count(config.initial);

    let vm = match config.backend {
        Backend::Memory => CounterViewModel::with_initial(config.initial, clock),
        Backend::Repository => {
            CounterViewModel::backed_by(Arc::new(repository.clone()), clock).await?
        },
    };

    println!("=== Counter ({:?} backend) ===\n", config.backend);
    println!("Initial count: {}", vm.count().await);

    let mut observer = vm.observe();
    let printer = tokio::spawn(async move {
        while let Some(count) = observer.changed().await {
            println!("  observer saw: {count}");
        }
    });

    for _ in 0..3 {
        println!("\n>>> increment");
        let count = vm.increment().await?;
        println!("Count after increment: {count}");
    }

    println!("\n>>> decrement");
    let count = vm.decrement().await?;
    println!("Count after decrement: {count}");

    if config.backend == Backend::Repository {
        let stored = repository.get_counter().await?.count;
        println!("\nRepository holds: {stored}");
    }

    vm.shutdown(config.shutdown_timeout()).await?;
    drop(vm);
    printer.await?;

    Ok(())
}
