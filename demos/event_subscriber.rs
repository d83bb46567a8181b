//! Event subscription example
//!
//! Demonstrates the event-driven observation surface: subscribe before
//! the batch starts and watch tasks progress without polling. Multiple
//! subscribers are supported; each receives all events independently.

use std::sync::Arc;
use std::time::Duration;

use scrape_pool::{Event, FetchPool, HttpPageFetcher, PoolConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = PoolConfig {
        parallelism: 2,
        max_attempts: 2,
        shutdown_timeout: Duration::from_secs(60),
        ..Default::default()
    };

    let pool = FetchPool::new(config)?;
    let fetcher = Arc::new(HttpPageFetcher::with_timeout(Duration::from_secs(10))?);

    let mut events = pool.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::TaskStarted { id } => println!("-> fetching {id}"),
                Event::TaskSucceeded { id, attempts } => {
                    println!("ok {id} (attempts: {attempts})");
                }
                Event::TaskFailed { id, attempts, error } => {
                    println!("failed {id} after {attempts} attempts: {error}");
                }
                Event::BatchFinished { state, stored } => {
                    println!("batch finished: {state:?}, {stored} results stored");
                    break;
                }
            }
        }
    });

    let urls = vec![
        "https://en.wikipedia.org/wiki/Ancient_Egypt".to_string(),
        "https://en.wikipedia.org/wiki/Renaissance".to_string(),
        "https://this-host-does-not-exist.invalid/".to_string(),
    ];

    let outcome = pool.run(urls, fetcher).await?;
    printer.await?;

    println!("{} pages fetched", outcome.store.len());
    Ok(())
}
