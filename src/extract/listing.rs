use scraper::Html;
use url::Url;

use crate::selectors::search;

/// Search-results URL for `keyword`, replacing any keyword already present
/// in `search_url`.
pub fn build_search_url(search_url: &Url, keyword: &str) -> Url {
    let kept: Vec<(String, String)> = search_url
        .query_pairs()
        .filter(|(name, _)| name != search::KEYWORD_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut url = search_url.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(search::KEYWORD_PARAM, keyword);
    url
}

/// Absolute URLs of every product link on a search-results page, in page order.
///
/// Anchors without `href` are skipped, as are hrefs that cannot be resolved
/// against `page_url`.
pub fn extract_product_links(document: &Html, page_url: &Url) -> Vec<Url> {
    document
        .select(&search::RESULT_LINK)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            match page_url.join(href) {
                Ok(url) => Some(url),
                Err(e) => {
                    log::warn!("Skipping unresolvable product link '{}': {}", href, e);
                    None
                }
            }
        })
        .collect()
}
