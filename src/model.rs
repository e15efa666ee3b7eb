use serde::{Deserialize, Serialize};

/// Serialized names of the offer fields that can be missing from a page.
pub mod field {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const IDENTIFIER: &str = "identifier";
    pub const PRICE: &str = "price";
    pub const SELLER_NAME: &str = "sellerName";
}

/// Extraction slot for a single offer field.
///
/// `NotAttempted` never leaves the crate: a completed offer has every
/// field in the `Attempted` state, where `Attempted(None)` means the
/// page had no element for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    NotAttempted,
    Attempted(Option<T>),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::NotAttempted
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        Field::Attempted(value)
    }
}

impl<T> Field<T> {
    pub fn is_attempted(&self) -> bool {
        matches!(self, Field::Attempted(_))
    }

    /// Attempted, but nothing was found.
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Attempted(None))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Attempted(Some(value)) => Some(value),
            _ => None,
        }
    }

    /// Collapse to the two-state form stored in output records.
    pub fn collapse(self, name: &str) -> Option<T> {
        match self {
            Field::Attempted(value) => value,
            Field::NotAttempted => {
                debug_assert!(false, "offer field `{name}` was never extracted");
                log::error!("Offer field '{}' was never extracted", name);
                None
            }
        }
    }
}

/// Fields identical across every offer on one product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedOfferData {
    pub item_url: String,
    pub keyword: String,
    pub title: Field<String>,
    pub description: Field<String>,
    pub identifier: Field<String>,
}

impl SharedOfferData {
    pub fn new(item_url: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            item_url: item_url.into(),
            keyword: keyword.into(),
            title: Field::NotAttempted,
            description: Field::NotAttempted,
            identifier: Field::NotAttempted,
        }
    }
}

/// One marketplace listing for a product, as built by the extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub shared: SharedOfferData,
    pub price: Field<String>,
    pub seller_name: Field<String>,
}

impl Offer {
    pub fn from_shared(shared: &SharedOfferData) -> Self {
        Self {
            shared: shared.clone(),
            price: Field::NotAttempted,
            seller_name: Field::NotAttempted,
        }
    }

    fn fields(&self) -> [(&'static str, &Field<String>); 5] {
        [
            (field::TITLE, &self.shared.title),
            (field::DESCRIPTION, &self.shared.description),
            (field::IDENTIFIER, &self.shared.identifier),
            (field::PRICE, &self.price),
            (field::SELLER_NAME, &self.seller_name),
        ]
    }

    /// Names of the fields that were looked for but not found.
    pub fn missing_fields(&self) -> Vec<String> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.is_missing())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Names of the fields no extractor has touched. Empty for every
    /// offer the extractors return.
    pub fn unattempted_fields(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| !value.is_attempted())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn into_record(self) -> OfferRecord {
        OfferRecord {
            item_url: self.shared.item_url,
            keyword: self.shared.keyword,
            title: self.shared.title.collapse(field::TITLE),
            description: self.shared.description.collapse(field::DESCRIPTION),
            identifier: self.shared.identifier.collapse(field::IDENTIFIER),
            price: self.price.collapse(field::PRICE),
            seller_name: self.seller_name.collapse(field::SELLER_NAME),
        }
    }
}

/// An offer as written to the output store. `None` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRecord {
    pub item_url: String,
    pub keyword: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub identifier: Option<String>,
    pub price: Option<String>,
    pub seller_name: Option<String>,
}

/// Entry of the anomaly trail. Snapshots are referenced by location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "label")]
pub enum AnomalyRecord {
    #[serde(rename = "MISSING-PROPERTY", rename_all = "camelCase")]
    MissingProperty {
        product_page_url: String,
        main_offer_missing_fields: Vec<String>,
        other_offers_missing_fields: Vec<Vec<String>>,
        html_snapshot_location: String,
    },
    #[serde(rename = "UNEXPECTED-HTML", rename_all = "camelCase")]
    UnexpectedHtml {
        product_page_url: String,
        html_snapshot_location: String,
        error_message: String,
    },
}
