use thiserror::Error;

/// The page deviates from the template the extractors assume.
///
/// Raised when a selector that may match at most once matches several
/// elements, or when the rendering layer fails or times out while a page
/// is being extracted.
#[derive(Error, Debug)]
pub enum StructuralViolation {
    #[error("Found too many title elements")]
    TooManyTitles,
    #[error("Found too many descriptions")]
    TooManyDescriptions,
    #[error("Found too many details table bodies")]
    TooManyDetailsTables,
    #[error("Found row with th '{label}' but {found} td cells next to it (expected exactly one)")]
    IdentifierCell { label: &'static str, found: usize },
    #[error("Found too many seller names for main offer")]
    TooManySellerNames,
    #[error("Unexpected pricing HTML")]
    UnexpectedPricing,
    #[error("Found too many other offers links")]
    TooManyOtherOffersLinks,
    #[error("Found more than one price for offer {position}")]
    TooManyOfferPrices { position: usize },
    #[error("Found more than one seller for offer {position}")]
    TooManyOfferSellers { position: usize },
    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failures of the rendering layer (navigation, queries, interaction).
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
    #[error("Timeout: waited {timeout_ms}ms for selector '{selector}'")]
    Timeout { selector: String, timeout_ms: u64 },
    #[error("Element {index} of '{selector}' is no longer on the page")]
    StaleHandle { selector: String, index: usize },
    #[error("Element {index} of '{selector}' cannot be clicked: {reason}")]
    NotClickable {
        selector: String,
        index: usize,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue rejected '{url}': {reason}")]
    Rejected { url: String, reason: String },
}

/// Everything that can fail a single request handled by the crawler.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Structure(#[from] StructuralViolation),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}
