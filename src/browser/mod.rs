//! Interface to the rendering layer.
//!
//! Extraction never holds a parsed document across an `.await`: the page
//! content is fetched first and [`evaluate`] runs the query synchronously.

pub mod http;

use async_trait::async_trait;
use scraper::Html;

use crate::error::RenderError;

pub use http::{HttpBrowser, HttpPage};

/// Reference to the `index`-th element matched by `selector` on a live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

/// One open page. Pages are never shared between crawl jobs.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    fn url(&self) -> &str;

    async fn wait_for_load(&mut self) -> Result<(), RenderError>;

    /// Current HTML of the page, including anything added by interaction.
    async fn content(&self) -> Result<String, RenderError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, RenderError>;

    async fn click(&mut self, element: &ElementHandle) -> Result<(), RenderError>;

    /// Resolves once `selector` matches, or fails with [`RenderError::Timeout`].
    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), RenderError>;
}

#[async_trait]
pub trait Browser: Send + Sync {
    /// Navigate a fresh page to `url`.
    async fn open(&self, url: &str) -> Result<Box<dyn BrowserPage>, RenderError>;
}

/// Run `query` against the page's current DOM.
pub async fn evaluate<T, F>(page: &dyn BrowserPage, query: F) -> Result<T, RenderError>
where
    F: FnOnce(&Html) -> T,
{
    let html = page.content().await?;
    Ok(run_query(&html, query))
}

fn run_query<T>(html: &str, query: impl FnOnce(&Html) -> T) -> T {
    let document = Html::parse_document(html);
    query(&document)
}
