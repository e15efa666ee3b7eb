//! Fixture rendering layer: pages are fixed HTML strings, and clicking the
//! other-offers link splices a prepared panel into the page.

#![allow(dead_code)]

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;

use offer_crawler::queue::{CrawlRequest, Label, RequestMetadata};
use offer_crawler::storage::{MemoryDataset, MemorySnapshotStore, Storage};
use offer_crawler::{Browser, BrowserPage, ElementHandle, RenderError};

#[derive(Debug, Clone)]
pub struct FixturePage {
    url: String,
    html: String,
    panel: Option<String>,
}

impl FixturePage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            panel: None,
        }
    }

    /// HTML that appears in the page once any element is clicked.
    pub fn with_panel(mut self, panel: impl Into<String>) -> Self {
        self.panel = Some(panel.into());
        self
    }
}

fn count(html: &str, selector: &str) -> Result<usize, RenderError> {
    let selector =
        Selector::parse(selector).map_err(|e| RenderError::InvalidSelector(e.to_string()))?;
    Ok(Html::parse_document(html).select(&selector).count())
}

#[async_trait]
impl BrowserPage for FixturePage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn wait_for_load(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    async fn content(&self) -> Result<String, RenderError> {
        Ok(self.html.clone())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, RenderError> {
        let found = count(&self.html, selector)?;
        Ok((0..found).map(|index| ElementHandle::new(selector, index)).collect())
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), RenderError> {
        if element.index >= count(&self.html, &element.selector)? {
            return Err(RenderError::StaleHandle {
                selector: element.selector.clone(),
                index: element.index,
            });
        }
        if let Some(panel) = self.panel.take() {
            match self.html.rfind("</body>") {
                Some(end) => self.html.insert_str(end, &panel),
                None => self.html.push_str(&panel),
            }
        }
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), RenderError> {
        if count(&self.html, selector)? > 0 {
            Ok(())
        } else {
            Err(RenderError::Timeout {
                selector: selector.to_string(),
                timeout_ms: 0,
            })
        }
    }
}

/// Serves fixture pages by URL; unknown URLs fail like a 404.
#[derive(Debug, Clone, Default)]
pub struct FixtureBrowser {
    pages: HashMap<String, FixturePage>,
}

impl FixtureBrowser {
    pub fn with_page(mut self, page: FixturePage) -> Self {
        self.pages.insert(page.url.clone(), page);
        self
    }
}

#[async_trait]
impl Browser for FixtureBrowser {
    async fn open(&self, url: &str) -> Result<Box<dyn BrowserPage>, RenderError> {
        match self.pages.get(url) {
            Some(page) => Ok(Box::new(page.clone())),
            None => Err(RenderError::UnexpectedStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

pub struct MemoryStorage {
    pub storage: Storage,
    pub dataset: Arc<MemoryDataset>,
    pub snapshots: Arc<MemorySnapshotStore>,
}

pub fn memory_storage() -> MemoryStorage {
    let dataset = Arc::new(MemoryDataset::new());
    let snapshots = Arc::new(MemorySnapshotStore::new());
    MemoryStorage {
        storage: Storage {
            offers: dataset.clone(),
            anomalies: dataset.clone(),
            snapshots: snapshots.clone(),
        },
        dataset,
        snapshots,
    }
}

pub fn product_request(id: &str, url: &str) -> CrawlRequest {
    CrawlRequest {
        id: id.to_string(),
        url: url.to_string(),
        label: Label::Product,
        metadata: RequestMetadata::new("lamp"),
        retry_count: 0,
    }
}

// ---------------------------------------------------------------------------
// Product page building blocks
// ---------------------------------------------------------------------------

pub fn page(parts: &[&str]) -> String {
    format!("<html><head><title>Shop</title></head><body>{}</body></html>", parts.concat())
}

pub fn title(text: &str) -> String {
    format!("<div id='title'><span>{text}</span></div>")
}

pub fn description(text: &str) -> String {
    format!("<div id='productDescription'><p>{text}</p></div>")
}

pub fn identifier(value: &str) -> String {
    format!(
        "<table id='productDetails_detailBullets_sections1'>\
         <tr><th>Manufacturer</th><td>Acme</td></tr>\
         <tr><th>ASIN</th><td>{value}</td></tr></table>"
    )
}

pub fn seller(name: &str) -> String {
    format!(
        "<div id='tabular-buybox'><div class='tabular-buybox-container'>\
         <div class='tabular-buybox-text' tabular-attribute-name='Sold by'>{name}</div>\
         </div></div>"
    )
}

pub fn prices(values: &[&str]) -> String {
    let spans: String = values
        .iter()
        .map(|v| format!("<span class='a-price'><span class='a-offscreen'>{v}</span></span>"))
        .collect();
    format!("<div id='corePrice_desktop'>{spans}</div>")
}

pub const AVAILABILITY_WIDGET: &str =
    "<div cel_widget_id='Availability'><span>Currently unavailable.</span></div>";

pub const OTHER_OFFERS_LINK: &str =
    "<div id='olpLinkWidget_feature_div'><a href='/gp/offer-listing/B08ABC123'>New &amp; Used (3)</a></div>";

pub fn offer_row(position: usize, price: Option<&str>, seller: Option<&str>) -> String {
    let price = price
        .map(|p| format!("<div id='aod-price-{position}'><span class='a-offscreen'>{p}</span></div>"))
        .unwrap_or_default();
    let seller = seller
        .map(|s| format!("<div id='aod-offer-soldBy'><a href='/sp?seller={position}'>{s}</a></div>"))
        .unwrap_or_default();
    format!("<div id='aod-offer'>{price}{seller}</div>")
}

pub fn offer_panel(rows: &[String]) -> String {
    format!("<div id='aod-container'><div id='aod-offer-list'>{}</div></div>", rows.concat())
}
