use scraper::Html;

use crate::dom::{joined_text, matches, optional_text, trimmed_text, Matches, QueryScope};
use crate::error::StructuralViolation;
use crate::model::{Offer, SharedOfferData};
use crate::selectors::product;

/// Either unavailability signal is enough.
pub fn is_unavailable(document: &Html) -> bool {
    if !document.query(&product::AVAILABILITY_WIDGET).is_empty() {
        return true;
    }
    joined_text(document, &product::AVAILABILITY_TEXT) == product::UNAVAILABLE_TEXT
}

/// The buy-box offer, or `None` when the product cannot currently be bought.
pub fn extract_main_offer(
    document: &Html,
    shared: &SharedOfferData,
) -> Result<Option<Offer>, StructuralViolation> {
    if is_unavailable(document) {
        return Ok(None);
    }

    let mut offer = Offer::from_shared(shared);
    offer.seller_name = optional_text(document, &product::MAIN_SELLER, || {
        StructuralViolation::TooManySellerNames
    })?
    .into();
    offer.price = extract_main_price(document)?.into();
    Ok(Some(offer))
}

// The price is rendered once or twice depending on the product; the
// fallback selector only disambiguates the second case.
fn extract_main_price(document: &Html) -> Result<Option<String>, StructuralViolation> {
    match matches(document, &product::MAIN_PRICE) {
        Matches::Zero => Ok(None),
        Matches::One(element) => Ok(Some(trimmed_text(element))),
        Matches::Many(_) => match matches(document, &product::MAIN_PRICE_FALLBACK) {
            Matches::One(element) => Ok(Some(trimmed_text(element))),
            Matches::Zero | Matches::Many(_) => Err(StructuralViolation::UnexpectedPricing),
        },
    }
}
