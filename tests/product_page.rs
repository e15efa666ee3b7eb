//! Product-page jobs end to end: extraction, anomaly trail and offer output,
//! run against fixture pages with in-memory stores.

mod common;

use common::*;
use offer_crawler::error::{CrawlError, RenderError, StructuralViolation};
use offer_crawler::routes::handle_product;
use offer_crawler::{AnomalyRecord, OfferRecord};

const URL: &str = "https://www.amazon.com/Desk-Lamp/dp/B08ABC123";

fn record(price: Option<&str>, seller: Option<&str>, description: Option<&str>) -> OfferRecord {
    OfferRecord {
        item_url: URL.to_string(),
        keyword: "lamp".to_string(),
        title: Some("X".to_string()),
        description: description.map(str::to_string),
        identifier: Some("B08ABC123".to_string()),
        price: price.map(str::to_string),
        seller_name: seller.map(str::to_string),
    }
}

#[tokio::test]
async fn available_product_with_missing_description_reports_gap() {
    let html = page(&[
        &title("  X  "),
        &identifier("B08ABC123"),
        &seller("Acme Store"),
        &prices(&["$19.99"]),
    ]);
    let mut page = FixturePage::new(URL, html.clone());
    let stores = memory_storage();

    let written = handle_product(&product_request("7", URL), &mut page, &stores.storage)
        .await
        .unwrap();

    assert_eq!(written, 1);
    assert_eq!(
        stores.dataset.offers(),
        vec![record(Some("$19.99"), Some("Acme Store"), None)]
    );
    assert_eq!(
        stores.dataset.anomalies(),
        vec![AnomalyRecord::MissingProperty {
            product_page_url: URL.to_string(),
            main_offer_missing_fields: vec!["description".to_string()],
            other_offers_missing_fields: vec![],
            html_snapshot_location: "memory://HTML-PROPERTY-NOT-FOUND-7.html".to_string(),
        }]
    );
    assert_eq!(stores.snapshots.get("HTML-PROPERTY-NOT-FOUND-7"), Some(html));
}

#[tokio::test]
async fn unavailable_product_writes_nothing_and_reports_nothing() {
    let html = page(&[
        &title("X"),
        AVAILABILITY_WIDGET,
        &seller("Acme Store"),
        &prices(&["$19.99"]),
    ]);
    let mut page = FixturePage::new(URL, html);
    let stores = memory_storage();

    let written = handle_product(&product_request("8", URL), &mut page, &stores.storage)
        .await
        .unwrap();

    assert_eq!(written, 0);
    assert!(stores.dataset.offers().is_empty());
    assert!(stores.dataset.anomalies().is_empty());
    assert!(stores.snapshots.keys().is_empty());
    assert_eq!(stores.dataset.append_calls(), 1);
}

#[tokio::test]
async fn ambiguous_pricing_fails_the_page_with_unexpected_html() {
    let html = page(&[
        &title("X"),
        &description("Bright"),
        &identifier("B08ABC123"),
        &seller("Acme Store"),
        &prices(&["$19.99", "$24.99", "$29.99"]),
    ]);
    let mut page = FixturePage::new(URL, html.clone());
    let stores = memory_storage();

    let err = handle_product(&product_request("9", URL), &mut page, &stores.storage)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CrawlError::Structure(StructuralViolation::UnexpectedPricing)
    ));
    assert_eq!(err.to_string(), "Unexpected pricing HTML");
    assert_eq!(
        stores.dataset.anomalies(),
        vec![AnomalyRecord::UnexpectedHtml {
            product_page_url: URL.to_string(),
            html_snapshot_location: "memory://UNEXPECTED-HTML-9.html".to_string(),
            error_message: "Unexpected pricing HTML".to_string(),
        }]
    );
    assert_eq!(stores.snapshots.get("UNEXPECTED-HTML-9"), Some(html));
    assert_eq!(stores.dataset.append_calls(), 0);
}

#[tokio::test]
async fn duplicated_title_stops_before_offers() {
    let html = page(&[&title("A"), &title("B"), &seller("Acme"), &prices(&["$1"])]);
    let mut page = FixturePage::new(URL, html);
    let stores = memory_storage();

    let err = handle_product(&product_request("10", URL), &mut page, &stores.storage)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Found too many title elements");
    assert!(stores.dataset.offers().is_empty());
    let anomalies = stores.dataset.anomalies();
    assert_eq!(anomalies.len(), 1);
    assert!(matches!(
        &anomalies[0],
        AnomalyRecord::UnexpectedHtml { error_message, .. } if !error_message.is_empty()
    ));
}

#[tokio::test]
async fn other_offers_follow_main_offer_in_panel_order() {
    let panel = offer_panel(&[
        offer_row(1, Some("$18.00"), Some("Second Hand Co")),
        offer_row(2, Some("$18.50"), None),
        offer_row(3, Some("$21.00"), Some("Lamp World")),
    ]);
    let html = page(&[
        &title("X"),
        &description("Bright"),
        &identifier("B08ABC123"),
        &seller("Acme Store"),
        &prices(&["$19.99"]),
        OTHER_OFFERS_LINK,
    ]);
    let mut page = FixturePage::new(URL, html).with_panel(panel);
    let stores = memory_storage();

    let written = handle_product(&product_request("11", URL), &mut page, &stores.storage)
        .await
        .unwrap();

    assert_eq!(written, 4);
    assert_eq!(
        stores.dataset.offers(),
        vec![
            record(Some("$19.99"), Some("Acme Store"), Some("Bright")),
            record(Some("$18.00"), Some("Second Hand Co"), Some("Bright")),
            record(Some("$18.50"), None, Some("Bright")),
            record(Some("$21.00"), Some("Lamp World"), Some("Bright")),
        ]
    );
    match &stores.dataset.anomalies()[..] {
        [AnomalyRecord::MissingProperty {
            main_offer_missing_fields,
            other_offers_missing_fields,
            ..
        }] => {
            assert!(main_offer_missing_fields.is_empty());
            assert_eq!(
                other_offers_missing_fields,
                &vec![vec![], vec!["sellerName".to_string()], vec![]]
            );
        }
        other => panic!("expected one missing-property anomaly, got {other:?}"),
    }
}

#[tokio::test]
async fn unavailable_product_still_collects_other_offers() {
    let panel = offer_panel(&[offer_row(1, Some("$30.00"), Some("Reseller"))]);
    let html = page(&[
        &title("X"),
        &description("Bright"),
        &identifier("B08ABC123"),
        AVAILABILITY_WIDGET,
        OTHER_OFFERS_LINK,
    ]);
    let mut page = FixturePage::new(URL, html).with_panel(panel);
    let stores = memory_storage();

    handle_product(&product_request("12", URL), &mut page, &stores.storage)
        .await
        .unwrap();

    assert_eq!(
        stores.dataset.offers(),
        vec![record(Some("$30.00"), Some("Reseller"), Some("Bright"))]
    );
    assert!(stores.dataset.anomalies().is_empty());
}

#[tokio::test]
async fn panel_that_never_opens_is_a_structural_failure() {
    let html = page(&[
        &title("X"),
        &description("Bright"),
        &identifier("B08ABC123"),
        &seller("Acme Store"),
        &prices(&["$19.99"]),
        OTHER_OFFERS_LINK,
    ]);
    let mut page = FixturePage::new(URL, html);
    let stores = memory_storage();

    let err = handle_product(&product_request("13", URL), &mut page, &stores.storage)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CrawlError::Structure(StructuralViolation::Render(RenderError::Timeout { .. }))
    ));
    // The main offer was extracted, but nothing reaches the output store.
    assert!(stores.dataset.offers().is_empty());
    assert_eq!(stores.snapshots.keys(), vec!["UNEXPECTED-HTML-13".to_string()]);
}

#[tokio::test]
async fn two_other_offers_links_are_a_structural_failure() {
    let html = page(&[&title("X"), AVAILABILITY_WIDGET, OTHER_OFFERS_LINK, OTHER_OFFERS_LINK]);
    let mut page = FixturePage::new(URL, html);
    let stores = memory_storage();

    let err = handle_product(&product_request("14", URL), &mut page, &stores.storage)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Found too many other offers links");
    assert_eq!(stores.dataset.anomalies().len(), 1);
}
