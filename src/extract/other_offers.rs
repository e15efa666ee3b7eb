use scraper::Html;

use crate::browser::{evaluate, BrowserPage};
use crate::dom::{optional_text, parse_selector, QueryScope};
use crate::error::StructuralViolation;
use crate::model::{Offer, SharedOfferData};
use crate::selectors::other_offers;

/// Open the other-offers panel and extract its rows in panel order.
///
/// A page without the panel link has no secondary offers. Clicking and
/// waiting for the panel are the only interactions with the live page;
/// a wait timeout comes back as [`StructuralViolation::Render`].
pub async fn extract_other_offers(
    page: &mut dyn BrowserPage,
    shared: &SharedOfferData,
) -> Result<Vec<Offer>, StructuralViolation> {
    let links = page.query_all(other_offers::LINK).await?;
    let link = match links.as_slice() {
        [] => return Ok(Vec::new()),
        [link] => link.clone(),
        _ => return Err(StructuralViolation::TooManyOtherOffersLinks),
    };

    page.click(&link).await?;
    page.wait_for_selector(other_offers::LIST).await?;

    evaluate(&*page, |document| extract_offer_rows(document, shared)).await?
}

/// Offers of an opened panel. Row `i` (1-based) scopes its own price selector.
pub fn extract_offer_rows(
    document: &Html,
    shared: &SharedOfferData,
) -> Result<Vec<Offer>, StructuralViolation> {
    document
        .query(&other_offers::ROWS)
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let position = index + 1;
            let price_selector = parse_selector(&other_offers::price_css(position))?;

            let mut offer = Offer::from_shared(shared);
            offer.price = optional_text(row, &price_selector, || {
                StructuralViolation::TooManyOfferPrices { position }
            })?
            .into();
            offer.seller_name = optional_text(row, &other_offers::SELLER, || {
                StructuralViolation::TooManyOfferSellers { position }
            })?
            .into();
            Ok(offer)
        })
        .collect()
}
