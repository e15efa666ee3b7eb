use futures::future::try_join_all;
use url::Url;

use crate::browser::{evaluate, BrowserPage};
use crate::error::{CrawlError, RenderError};
use crate::extract::extract_product_links;
use crate::queue::{CrawlRequest, Label, RequestQueue};

/// Enqueue every product linked from a search-results page.
///
/// Returns how many product requests were newly added to the queue.
pub async fn handle_start(
    request: &CrawlRequest,
    page: &mut dyn BrowserPage,
    queue: &dyn RequestQueue,
) -> Result<usize, CrawlError> {
    page.wait_for_load().await?;

    let page_url = Url::parse(&request.url)
        .map_err(|e| RenderError::InvalidUrl(format!("{}: {}", request.url, e)))?;
    let links = evaluate(&*page, |document| extract_product_links(document, &page_url)).await?;

    log::debug!(
        "[{}] Enqueueing the following links with label {}: {:?}",
        request.label,
        Label::Product,
        links.iter().map(Url::as_str).collect::<Vec<_>>()
    );

    let added = try_join_all(
        links
            .iter()
            .map(|link| queue.enqueue(link.as_str(), Label::Product, request.metadata.clone())),
    )
    .await?;
    let added = added.into_iter().filter(|new| *new).count();

    log::info!(
        "[{}] Enqueued {} {} ({} found)",
        request.label,
        added,
        Label::Product,
        links.len()
    );
    Ok(added)
}
