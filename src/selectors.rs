//! CSS selectors for the product and search-result page templates.
//!
//! Selectors passed to the live page are kept as strings; the ones queried
//! against a parsed document are compiled once.

use scraper::Selector;
use std::sync::LazyLock;

fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("built-in selector '{css}' is invalid: {e}"))
}

pub mod product {
    use super::*;

    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| compile("#title"));

    /// Some product types render the title in a widget instead.
    pub static TITLE_FALLBACK: LazyLock<Selector> =
        LazyLock::new(|| compile("div[data-cel-widget='Title']"));

    pub static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| compile("#productDescription"));

    pub static DETAILS_TABLE: LazyLock<Selector> =
        LazyLock::new(|| compile("#productDetails_detailBullets_sections1"));

    pub static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| compile("th"));

    /// Header text of the details row holding the product identifier.
    pub const IDENTIFIER_LABEL: &str = "ASIN";

    /// Present at all only when the product cannot be bought.
    pub static AVAILABILITY_WIDGET: LazyLock<Selector> =
        LazyLock::new(|| compile("div[cel_widget_id='Availability']"));

    pub static AVAILABILITY_TEXT: LazyLock<Selector> =
        LazyLock::new(|| compile("#availability span"));

    pub const UNAVAILABLE_TEXT: &str = "Currently unavailable.";

    pub static MAIN_SELLER: LazyLock<Selector> = LazyLock::new(|| {
        compile(
            "#tabular-buybox .tabular-buybox-container \
             div.tabular-buybox-text[tabular-attribute-name='Sold by']",
        )
    });

    pub static MAIN_PRICE: LazyLock<Selector> =
        LazyLock::new(|| compile("#corePrice_desktop span.a-price span.a-offscreen"));

    /// Only meaningful when `MAIN_PRICE` is ambiguous.
    pub static MAIN_PRICE_FALLBACK: LazyLock<Selector> =
        LazyLock::new(|| compile("#newAccordionRow #corePrice_feature_div span.a-offscreen"));
}

pub mod other_offers {
    use super::*;

    pub const LINK: &str = "#olpLinkWidget_feature_div a";

    pub const LIST: &str = "#aod-offer-list";

    pub static ROWS: LazyLock<Selector> = LazyLock::new(|| compile("#aod-offer-list > div"));

    pub static SELLER: LazyLock<Selector> = LazyLock::new(|| compile("#aod-offer-soldBy a"));

    /// Price selector for the row at 1-based `position`.
    pub fn price_css(position: usize) -> String {
        format!("#aod-price-{position} span.a-offscreen")
    }
}

pub mod search {
    use super::*;

    pub static RESULT_LINK: LazyLock<Selector> = LazyLock::new(|| {
        compile(".s-main-slot div[data-component-type='s-search-result'] h2.a-size-mini a")
    });

    /// Query parameter carrying the search keyword.
    pub const KEYWORD_PARAM: &str = "field-keywords";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_selectors_compile() {
        for selector in [
            &product::TITLE,
            &product::TITLE_FALLBACK,
            &product::DESCRIPTION,
            &product::DETAILS_TABLE,
            &product::HEADER_CELL,
            &product::AVAILABILITY_WIDGET,
            &product::AVAILABILITY_TEXT,
            &product::MAIN_SELLER,
            &product::MAIN_PRICE,
            &product::MAIN_PRICE_FALLBACK,
            &other_offers::ROWS,
            &other_offers::SELLER,
            &search::RESULT_LINK,
        ] {
            LazyLock::force(selector);
        }
        for css in [other_offers::LINK, other_offers::LIST] {
            assert!(Selector::parse(css).is_ok(), "{css}");
        }
        assert!(Selector::parse(&other_offers::price_css(3)).is_ok());
    }
}
