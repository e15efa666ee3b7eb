use scraper::Html;

use crate::dom::{matches, optional_text, sibling_elements, trimmed_text, Matches, QueryScope};
use crate::error::StructuralViolation;
use crate::model::SharedOfferData;
use crate::selectors::product;

/// Extract the fields every offer on the product page shares.
pub fn extract_shared(
    document: &Html,
    item_url: &str,
    keyword: &str,
) -> Result<SharedOfferData, StructuralViolation> {
    let mut shared = SharedOfferData::new(item_url, keyword);
    shared.title = extract_title(document)?.into();
    shared.description = extract_description(document)?.into();
    shared.identifier = extract_identifier(document)?.into();
    Ok(shared)
}

pub fn extract_title(document: &Html) -> Result<Option<String>, StructuralViolation> {
    match matches(document, &product::TITLE) {
        Matches::One(element) => Ok(Some(trimmed_text(element))),
        Matches::Zero => optional_text(document, &product::TITLE_FALLBACK, || {
            StructuralViolation::TooManyTitles
        }),
        Matches::Many(_) => Err(StructuralViolation::TooManyTitles),
    }
}

pub fn extract_description(document: &Html) -> Result<Option<String>, StructuralViolation> {
    optional_text(document, &product::DESCRIPTION, || {
        StructuralViolation::TooManyDescriptions
    })
}

/// Identifier from the product details table, looked up by its row header.
pub fn extract_identifier(document: &Html) -> Result<Option<String>, StructuralViolation> {
    let table = match matches(document, &product::DETAILS_TABLE) {
        Matches::Zero => return Ok(None),
        Matches::One(table) => table,
        Matches::Many(_) => return Err(StructuralViolation::TooManyDetailsTables),
    };

    let header = table
        .query(&product::HEADER_CELL)
        .into_iter()
        .find(|th| trimmed_text(*th) == product::IDENTIFIER_LABEL);
    let Some(header) = header else {
        return Ok(None);
    };

    let cells: Vec<_> = sibling_elements(header)
        .filter(|element| element.value().name() == "td")
        .collect();
    match cells.as_slice() {
        [cell] => Ok(Some(trimmed_text(*cell))),
        _ => Err(StructuralViolation::IdentifierCell {
            label: product::IDENTIFIER_LABEL,
            found: cells.len(),
        }),
    }
}
