use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use offer_crawler::browser::HttpBrowser;
use offer_crawler::config::Args;
use offer_crawler::extract::build_search_url;
use offer_crawler::output::output_results;
use offer_crawler::storage::{
    read_offers, FileSnapshotStore, JsonLinesDataset, LocalPathLocator, RemoteLocator,
    SnapshotLocator, Storage,
};
use offer_crawler::{Crawler, Label, MemoryQueue, RequestMetadata, RequestQueue};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    let config = args.into_config()?;

    log::info!("🚀 Offer crawler v{}", env!("CARGO_PKG_VERSION"));
    log::info!("🔎 Searching offers for '{}'", config.keyword);

    let offers = Arc::new(
        JsonLinesDataset::create(config.storage_dir.join("datasets/default.jsonl")).await?,
    );
    let reporting =
        Arc::new(JsonLinesDataset::create(config.storage_dir.join("datasets/reporting.jsonl")).await?);
    let locator: Box<dyn SnapshotLocator> = match &config.snapshot_base_url {
        Some(base_url) => Box::new(RemoteLocator::new(base_url.clone())),
        None => Box::new(LocalPathLocator::new(&config.storage_dir)),
    };
    let storage = Storage {
        offers: offers.clone(),
        anomalies: reporting.clone(),
        snapshots: Arc::new(FileSnapshotStore::new(&config.storage_dir, locator)),
    };

    let queue = Arc::new(MemoryQueue::new(config.max_retries));
    let start_url = build_search_url(&config.search_url, &config.keyword);
    queue
        .enqueue(start_url.as_str(), Label::Start, RequestMetadata::new(&config.keyword))
        .await?;

    let browser = Arc::new(HttpBrowser::new(&config.browser)?);
    let crawler = Crawler::new(browser, queue.clone(), storage, config.max_concurrency);

    log::info!("Starting the crawl.");
    let stats = crawler.run().await;
    log::info!(
        "Crawl finished. {} page(s) handled, {} failed, {} offer(s) written",
        stats.handled,
        stats.failed,
        stats.offers_written
    );
    for request in queue.failed_requests() {
        log::warn!("Gave up on [{}] {}", request.label, request.url);
    }
    log::info!("📋 Anomalies recorded in {}", reporting.path().display());

    let records = read_offers(offers.path()).await?;
    output_results(&records, &config.output)?;

    log::info!("✅ Exported {} offer(s)", records.len());
    Ok(())
}
