//! Keyword-driven marketplace offer crawler.
//!
//! A search-results page feeds product pages into the queue; each product
//! page yields its buy-box offer and every offer of the other-offers panel.
//! Pages that do not match the expected template are recorded in an anomaly
//! trail together with a snapshot of their HTML.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod dom;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod queue;
pub mod report;
pub mod routes;
pub mod selectors;
pub mod storage;

pub use browser::{Browser, BrowserPage, ElementHandle};
pub use crawler::{CrawlStats, Crawler};
pub use error::{CrawlError, RenderError, StoreError, StructuralViolation};
pub use model::{AnomalyRecord, Field, Offer, OfferRecord, SharedOfferData};
pub use queue::{CrawlRequest, Label, MemoryQueue, RequestMetadata, RequestQueue};
pub use storage::Storage;
