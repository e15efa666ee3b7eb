//! Crawl frontier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Mutex;
use url::Url;

use crate::error::QueueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    /// Search-results page.
    Start,
    /// Product detail page.
    Product,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Start => f.write_str("START"),
            Label::Product => f.write_str("PRODUCT"),
        }
    }
}

/// Data carried from a request to everything derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub keyword: String,
}

impl RequestMetadata {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub id: String,
    pub url: String,
    pub label: Label,
    pub metadata: RequestMetadata,
    pub retry_count: u32,
}

#[async_trait]
pub trait RequestQueue: Send + Sync {
    /// Returns `false` when the URL was enqueued before.
    async fn enqueue(
        &self,
        url: &str,
        label: Label,
        metadata: RequestMetadata,
    ) -> Result<bool, QueueError>;

    async fn fetch_next(&self) -> Option<CrawlRequest>;

    async fn mark_handled(&self, request: &CrawlRequest);

    /// Give a failed request back. Returns `false` once it has used up its
    /// retries and will not be handed out again.
    async fn reclaim(&self, request: CrawlRequest) -> bool;

    async fn is_finished(&self) -> bool;
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<CrawlRequest>,
    seen: HashSet<String>,
    next_id: u64,
    in_progress: usize,
    handled: usize,
    failed: Vec<CrawlRequest>,
}

/// In-process queue: FIFO, deduplicated by URL, bounded retries.
#[derive(Debug)]
pub struct MemoryQueue {
    state: Mutex<QueueState>,
    max_retries: u32,
}

impl MemoryQueue {
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            max_retries,
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn handled_count(&self) -> usize {
        self.state().handled
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    /// Requests that ran out of retries.
    pub fn failed_requests(&self) -> Vec<CrawlRequest> {
        self.state().failed.clone()
    }

    /// Every request not yet handed out, in queue order.
    pub fn pending_requests(&self) -> Vec<CrawlRequest> {
        self.state().pending.iter().cloned().collect()
    }
}

#[async_trait]
impl RequestQueue for MemoryQueue {
    async fn enqueue(
        &self,
        url: &str,
        label: Label,
        metadata: RequestMetadata,
    ) -> Result<bool, QueueError> {
        let parsed = Url::parse(url).map_err(|e| QueueError::Rejected {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let unique_key = parsed.to_string();

        let mut state = self.state();
        if !state.seen.insert(unique_key.clone()) {
            log::debug!("Skipping duplicate request {}", unique_key);
            return Ok(false);
        }
        state.next_id += 1;
        let id = state.next_id.to_string();
        state.pending.push_back(CrawlRequest {
            id,
            url: unique_key,
            label,
            metadata,
            retry_count: 0,
        });
        Ok(true)
    }

    async fn fetch_next(&self) -> Option<CrawlRequest> {
        let mut state = self.state();
        let request = state.pending.pop_front()?;
        state.in_progress += 1;
        Some(request)
    }

    async fn mark_handled(&self, _request: &CrawlRequest) {
        let mut state = self.state();
        state.in_progress = state.in_progress.saturating_sub(1);
        state.handled += 1;
    }

    async fn reclaim(&self, mut request: CrawlRequest) -> bool {
        let mut state = self.state();
        state.in_progress = state.in_progress.saturating_sub(1);
        if request.retry_count >= self.max_retries {
            log::error!(
                "Request {} failed {} times, giving up",
                request.url,
                request.retry_count + 1
            );
            state.failed.push(request);
            return false;
        }
        request.retry_count += 1;
        state.pending.push_back(request);
        true
    }

    async fn is_finished(&self) -> bool {
        let state = self.state();
        state.pending.is_empty() && state.in_progress == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> RequestMetadata {
        RequestMetadata::new("lamp")
    }

    #[tokio::test]
    async fn enqueue_dedups_by_normalized_url() {
        let queue = MemoryQueue::new(3);
        assert!(queue.enqueue("https://Shop.test/dp/1", Label::Product, meta()).await.unwrap());
        assert!(!queue.enqueue("https://shop.test/dp/1", Label::Product, meta()).await.unwrap());
        assert_eq!(queue.pending_count(), 1);
    }

    #[tokio::test]
    async fn enqueue_rejects_relative_urls() {
        let queue = MemoryQueue::new(3);
        let err = queue.enqueue("/dp/1", Label::Product, meta()).await.unwrap_err();
        assert!(matches!(err, QueueError::Rejected { .. }));
    }

    #[tokio::test]
    async fn requests_come_out_in_fifo_order_with_ids() {
        let queue = MemoryQueue::new(3);
        queue.enqueue("https://shop.test/a", Label::Start, meta()).await.unwrap();
        queue.enqueue("https://shop.test/b", Label::Product, meta()).await.unwrap();

        let first = queue.fetch_next().await.unwrap();
        let second = queue.fetch_next().await.unwrap();
        assert_eq!((first.id.as_str(), first.label), ("1", Label::Start));
        assert_eq!((second.id.as_str(), second.label), ("2", Label::Product));
        assert!(!queue.is_finished().await);

        queue.mark_handled(&first).await;
        queue.mark_handled(&second).await;
        assert!(queue.is_finished().await);
        assert_eq!(queue.handled_count(), 2);
    }

    #[tokio::test]
    async fn reclaim_retries_until_limit() {
        let queue = MemoryQueue::new(2);
        queue.enqueue("https://shop.test/a", Label::Product, meta()).await.unwrap();

        for attempt in 0..2 {
            let request = queue.fetch_next().await.unwrap();
            assert_eq!(request.retry_count, attempt);
            assert!(queue.reclaim(request).await);
        }
        let request = queue.fetch_next().await.unwrap();
        assert!(!queue.reclaim(request).await);

        assert!(queue.fetch_next().await.is_none());
        assert!(queue.is_finished().await);
        assert_eq!(queue.failed_requests().len(), 1);
        assert_eq!(queue.failed_requests()[0].retry_count, 2);
    }

    #[test]
    fn labels_serialize_uppercase() {
        assert_eq!(serde_json::to_string(&Label::Product).unwrap(), "\"PRODUCT\"");
        assert_eq!(Label::Start.to_string(), "START");
    }
}
