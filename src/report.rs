//! Missing-field checks and the anomaly trail.

use std::sync::Arc;

use crate::browser::BrowserPage;
use crate::error::{CrawlError, StructuralViolation};
use crate::model::{AnomalyRecord, Offer};
use crate::queue::CrawlRequest;
use crate::storage::{AnomalyStore, SnapshotStore, Storage, HTML_CONTENT_TYPE};

/// Field names that came back empty, per offer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingFieldReport {
    /// Empty when the page had no main offer.
    pub main_offer: Vec<String>,
    /// One list per secondary offer, in panel order.
    pub other_offers: Vec<Vec<String>>,
}

impl MissingFieldReport {
    pub fn compute(main_offer: Option<&Offer>, other_offers: &[Offer]) -> Self {
        Self {
            main_offer: main_offer.map(Offer::missing_fields).unwrap_or_default(),
            other_offers: other_offers.iter().map(Offer::missing_fields).collect(),
        }
    }

    pub fn has_gaps(&self) -> bool {
        !self.main_offer.is_empty() || self.other_offers.iter().any(|fields| !fields.is_empty())
    }
}

pub fn missing_property_key(request_id: &str) -> String {
    format!("HTML-PROPERTY-NOT-FOUND-{request_id}")
}

pub fn unexpected_html_key(request_id: &str) -> String {
    format!("UNEXPECTED-HTML-{request_id}")
}

/// Captures page snapshots and writes anomaly records.
pub struct AnomalyReporter {
    anomalies: Arc<dyn AnomalyStore>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl AnomalyReporter {
    pub fn new(anomalies: Arc<dyn AnomalyStore>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            anomalies,
            snapshots,
        }
    }

    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(storage.anomalies.clone(), storage.snapshots.clone())
    }

    async fn snapshot(&self, page: &dyn BrowserPage, key: &str) -> Result<String, CrawlError> {
        let html = page.content().await?;
        Ok(self.snapshots.put(key, &html, HTML_CONTENT_TYPE).await?)
    }

    pub async fn report_missing_fields(
        &self,
        request: &CrawlRequest,
        page: &dyn BrowserPage,
        report: &MissingFieldReport,
    ) -> Result<(), CrawlError> {
        let location = self.snapshot(page, &missing_property_key(&request.id)).await?;
        log::warn!(
            "[{}] Missing fields on {}: main offer {:?}, other offers {:?}",
            request.label,
            request.url,
            report.main_offer,
            report.other_offers
        );
        self.anomalies
            .append(&AnomalyRecord::MissingProperty {
                product_page_url: request.url.clone(),
                main_offer_missing_fields: report.main_offer.clone(),
                other_offers_missing_fields: report.other_offers.clone(),
                html_snapshot_location: location,
            })
            .await?;
        Ok(())
    }

    /// Record a structural failure. Errors while reporting are logged only,
    /// so the caller can always return the original violation.
    pub async fn report_unexpected_html(
        &self,
        request: &CrawlRequest,
        page: &dyn BrowserPage,
        violation: &StructuralViolation,
    ) {
        log::error!("[{}] Unexpected HTML on {}: {}", request.label, request.url, violation);
        if let Err(e) = self.try_report_unexpected_html(request, page, violation).await {
            log::error!(
                "[{}] Could not record unexpected HTML for {}: {}",
                request.label,
                request.url,
                e
            );
        }
    }

    async fn try_report_unexpected_html(
        &self,
        request: &CrawlRequest,
        page: &dyn BrowserPage,
        violation: &StructuralViolation,
    ) -> Result<(), CrawlError> {
        let location = self.snapshot(page, &unexpected_html_key(&request.id)).await?;
        self.anomalies
            .append(&AnomalyRecord::UnexpectedHtml {
                product_page_url: request.url.clone(),
                html_snapshot_location: location,
                error_message: violation.to_string(),
            })
            .await?;
        Ok(())
    }
}
