//! Extraction rules for the search-results and product page templates.
//!
//! Every selector that may match at most once is classified as zero, one
//! or many matches: zero is an empty field, one is the element's trimmed
//! text, many is a [`StructuralViolation`](crate::error::StructuralViolation).

pub mod listing;
pub mod main_offer;
pub mod other_offers;
pub mod shared;

pub use listing::{build_search_url, extract_product_links};
pub use main_offer::{extract_main_offer, is_unavailable};
pub use other_offers::{extract_offer_rows, extract_other_offers};
pub use shared::extract_shared;
