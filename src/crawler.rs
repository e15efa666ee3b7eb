use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinSet};

use crate::browser::Browser;
use crate::error::CrawlError;
use crate::queue::{CrawlRequest, Label, RequestQueue};
use crate::routes::{handle_product, handle_start};
use crate::storage::Storage;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    /// Requests that completed.
    pub handled: usize,
    /// Failed attempts handed back to the queue for another try.
    pub retried: usize,
    /// Requests given up on.
    pub failed: usize,
    pub products_enqueued: usize,
    pub offers_written: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    Enqueued(usize),
    Offers(usize),
}

/// Runs page jobs from the queue until it is drained.
pub struct Crawler {
    browser: Arc<dyn Browser>,
    queue: Arc<dyn RequestQueue>,
    storage: Storage,
    max_concurrency: usize,
}

impl Crawler {
    pub fn new(
        browser: Arc<dyn Browser>,
        queue: Arc<dyn RequestQueue>,
        storage: Storage,
        max_concurrency: usize,
    ) -> Self {
        Self {
            browser,
            queue,
            storage,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Process requests with at most `max_concurrency` pages open at once.
    ///
    /// A failing or panicking page never stops the crawl; failed requests
    /// go back to the queue, which decides whether they are retried. The
    /// crawl ends once the queue reports itself finished.
    pub async fn run(&self) -> CrawlStats {
        let mut stats = CrawlStats::default();
        let mut tasks = JoinSet::new();
        let mut running: HashMap<Id, CrawlRequest> = HashMap::new();

        loop {
            while tasks.len() < self.max_concurrency {
                let Some(request) = self.queue.fetch_next().await else {
                    break;
                };
                let job = PageJob {
                    browser: self.browser.clone(),
                    queue: self.queue.clone(),
                    storage: self.storage.clone(),
                };
                let task_request = request.clone();
                let handle = tasks.spawn(async move { job.process(&task_request).await });
                running.insert(handle.id(), request);
            }

            if tasks.is_empty() {
                if self.queue.is_finished().await {
                    break;
                }
                // Requests are still out with another consumer of the queue.
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                continue;
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                continue;
            };
            let (id, result) = match joined {
                Ok((id, outcome)) => (id, Ok(outcome)),
                Err(e) => (e.id(), Err(e)),
            };
            let Some(request) = running.remove(&id) else {
                log::error!("Finished page job {} has no request", id);
                continue;
            };

            match result {
                Ok(Ok(outcome)) => {
                    self.queue.mark_handled(&request).await;
                    stats.handled += 1;
                    match outcome {
                        PageOutcome::Enqueued(count) => stats.products_enqueued += count,
                        PageOutcome::Offers(count) => stats.offers_written += count,
                    }
                }
                Ok(Err(e)) => {
                    log::error!(
                        "[{}] Request {} failed (attempt {}): {}",
                        request.label,
                        request.url,
                        request.retry_count + 1,
                        e
                    );
                    self.give_back(request, &mut stats).await;
                }
                Err(e) => {
                    log::error!(
                        "[{}] Page job for {} aborted (attempt {}): {}",
                        request.label,
                        request.url,
                        request.retry_count + 1,
                        e
                    );
                    self.give_back(request, &mut stats).await;
                }
            }
        }

        stats
    }

    async fn give_back(&self, request: CrawlRequest, stats: &mut CrawlStats) {
        if self.queue.reclaim(request).await {
            stats.retried += 1;
        } else {
            stats.failed += 1;
        }
    }
}

struct PageJob {
    browser: Arc<dyn Browser>,
    queue: Arc<dyn RequestQueue>,
    storage: Storage,
}

impl PageJob {
    async fn process(&self, request: &CrawlRequest) -> Result<PageOutcome, CrawlError> {
        let mut page = self.browser.open(&request.url).await?;
        log::info!("Page opened. label={} url={}", request.label, request.url);

        match request.label {
            Label::Start => handle_start(request, page.as_mut(), self.queue.as_ref())
                .await
                .map(PageOutcome::Enqueued),
            Label::Product => handle_product(request, page.as_mut(), &self.storage)
                .await
                .map(PageOutcome::Offers),
        }
    }
}
