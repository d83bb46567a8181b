//! Basic scraping example
//!
//! This example demonstrates the core functionality of scrape-pool:
//! - Configuring the pool
//! - Running a fixed batch of URLs with bounded parallelism and retries
//! - Handling termination signals
//! - Writing the aggregated results to a JSON Lines file

use std::sync::Arc;
use std::time::Duration;

use scrape_pool::{FetchPool, HttpPageFetcher, JsonlSink, PoolConfig, deliver, run_with_shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = PoolConfig {
        parallelism: 4,
        max_attempts: 3,
        shutdown_timeout: Duration::from_secs(300),
        ..Default::default()
    };

    let pool = FetchPool::new(config)?;
    let fetcher = Arc::new(HttpPageFetcher::new()?);

    let urls = vec![
        "https://en.wikipedia.org/wiki/World_War_II".to_string(),
        "https://en.wikipedia.org/wiki/Industrial_Revolution".to_string(),
        "https://en.wikipedia.org/wiki/French_Revolution".to_string(),
        "https://en.wikipedia.org/wiki/Mughal_Empire".to_string(),
        "https://en.wikipedia.org/wiki/Ancient_Egypt".to_string(),
        "https://en.wikipedia.org/wiki/Renaissance".to_string(),
        "https://en.wikipedia.org/wiki/American_Civil_War".to_string(),
        "https://en.wikipedia.org/wiki/Partition_of_India".to_string(),
    ];

    // Ctrl+C force-stops the batch instead of waiting out the budget
    let outcome = run_with_shutdown(pool, urls, fetcher).await?;
    println!("batch terminated as {:?}", outcome.state);

    for (url, page) in outcome.store.snapshot() {
        println!("{url}: \"{}\" ({} links)", page.title, page.links.len());
    }

    let mut sink = JsonlSink::open("results.jsonl").await?;
    let written = deliver(&outcome.store, &mut sink).await?;
    println!("appended {written} records to results.jsonl");

    Ok(())
}
