use std::fmt;

use crate::browser::{evaluate, BrowserPage};
use crate::error::{CrawlError, StructuralViolation};
use crate::extract::{extract_main_offer, extract_other_offers, extract_shared};
use crate::model::{Offer, OfferRecord};
use crate::queue::CrawlRequest;
use crate::report::{AnomalyReporter, MissingFieldReport};
use crate::storage::Storage;

/// Progress of one product-page job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PageStage {
    Loading,
    ExtractingShared,
    ExtractingMain,
    ExtractingSecondary,
    Validating,
    Done,
    Failed,
}

impl fmt::Display for PageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageStage::Loading => "loading",
            PageStage::ExtractingShared => "extracting shared data",
            PageStage::ExtractingMain => "extracting main offer",
            PageStage::ExtractingSecondary => "extracting other offers",
            PageStage::Validating => "validating",
            PageStage::Done => "done",
            PageStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct StageTracker<'a> {
    url: &'a str,
    stage: PageStage,
}

impl<'a> StageTracker<'a> {
    fn new(url: &'a str) -> Self {
        log::debug!("[PRODUCT] {}: {}", url, PageStage::Loading);
        Self {
            url,
            stage: PageStage::Loading,
        }
    }

    fn advance(&mut self, next: PageStage) {
        debug_assert!(
            next > self.stage,
            "stage went from {} back to {}",
            self.stage,
            next
        );
        log::debug!("[PRODUCT] {}: {} -> {}", self.url, self.stage, next);
        self.stage = next;
    }
}

/// What a product page yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOffers {
    pub main_offer: Option<Offer>,
    pub other_offers: Vec<Offer>,
}

impl PageOffers {
    /// Main offer first, then the panel rows in order.
    pub fn into_records(self) -> Vec<OfferRecord> {
        self.main_offer
            .into_iter()
            .chain(self.other_offers)
            .map(Offer::into_record)
            .collect()
    }
}

/// Extract, validate and store every offer of one product page.
///
/// A structural violation is recorded as an `UNEXPECTED-HTML` anomaly and
/// returned unchanged; nothing is written to the offer store in that case.
/// Returns the number of offers written.
pub async fn handle_product(
    request: &CrawlRequest,
    page: &mut dyn BrowserPage,
    storage: &Storage,
) -> Result<usize, CrawlError> {
    log::debug!("[{}] Handling: {}", request.label, request.url);
    let reporter = AnomalyReporter::from_storage(storage);
    let mut tracker = StageTracker::new(&request.url);

    let offers = match extract_page(request, page, &mut tracker).await {
        Ok(offers) => offers,
        Err(violation) => {
            tracker.advance(PageStage::Failed);
            reporter.report_unexpected_html(request, &*page, &violation).await;
            return Err(violation.into());
        }
    };

    tracker.advance(PageStage::Validating);
    let report = MissingFieldReport::compute(offers.main_offer.as_ref(), &offers.other_offers);
    if report.has_gaps() {
        reporter.report_missing_fields(request, &*page, &report).await?;
    }

    let records = offers.into_records();
    log::info!("Data for {}: {} offer(s)", request.url, records.len());
    storage.offers.append(&records).await?;
    tracker.advance(PageStage::Done);
    Ok(records.len())
}

async fn extract_page(
    request: &CrawlRequest,
    page: &mut dyn BrowserPage,
    tracker: &mut StageTracker<'_>,
) -> Result<PageOffers, StructuralViolation> {
    page.wait_for_load().await?;

    tracker.advance(PageStage::ExtractingShared);
    let keyword = &request.metadata.keyword;
    let shared =
        evaluate(&*page, |document| extract_shared(document, &request.url, keyword)).await??;

    tracker.advance(PageStage::ExtractingMain);
    let main_offer = evaluate(&*page, |document| extract_main_offer(document, &shared)).await??;

    tracker.advance(PageStage::ExtractingSecondary);
    let other_offers = extract_other_offers(page, &shared).await?;

    Ok(PageOffers {
        main_offer,
        other_offers,
    })
}
