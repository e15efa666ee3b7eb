use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use super::{Browser, BrowserPage, ElementHandle};
use crate::config::BrowserConfig;
use crate::error::RenderError;

/// Rendering layer backed by plain HTTP requests.
///
/// Pages are static documents: scripts do not run, and clicking a link
/// fetches its target and appends the response to the page body.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    client: Client,
    interaction_timeout: Duration,
}

impl HttpBrowser {
    pub fn new(config: &BrowserConfig) -> Result<Self, RenderError> {
        let mut client_builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str());

        if let Some(proxy_url) = &config.proxy {
            log::debug!("Using proxy: {}", proxy_url);
            client_builder = client_builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        Ok(Self {
            client: client_builder.build()?,
            interaction_timeout: config.wait_timeout,
        })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open(&self, url: &str) -> Result<Box<dyn BrowserPage>, RenderError> {
        let parsed = Url::parse(url).map_err(|e| RenderError::InvalidUrl(format!("{url}: {e}")))?;
        let html = fetch(&self.client, &parsed).await?;
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            url: parsed,
            html,
            interaction_timeout: self.interaction_timeout,
        }))
    }
}

pub struct HttpPage {
    client: Client,
    url: Url,
    html: String,
    interaction_timeout: Duration,
}

impl HttpPage {
    fn splice(&mut self, fragment: &str) {
        match self.html.rfind("</body>") {
            Some(end) => self.html.insert_str(end, fragment),
            None => self.html.push_str(fragment),
        }
    }
}

#[async_trait]
impl BrowserPage for HttpPage {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn wait_for_load(&mut self) -> Result<(), RenderError> {
        // The whole document arrived with the navigation response.
        Ok(())
    }

    async fn content(&self) -> Result<String, RenderError> {
        Ok(self.html.clone())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, RenderError> {
        let parsed = parse_css(selector)?;
        let count = count_matches(&self.html, &parsed);
        Ok((0..count).map(|index| ElementHandle::new(selector, index)).collect())
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), RenderError> {
        let selector = parse_css(&element.selector)?;
        let href = match element_href(&self.html, &selector, element.index) {
            None => {
                return Err(RenderError::StaleHandle {
                    selector: element.selector.clone(),
                    index: element.index,
                })
            }
            Some(None) => {
                return Err(RenderError::NotClickable {
                    selector: element.selector.clone(),
                    index: element.index,
                    reason: "element has no href".to_string(),
                })
            }
            Some(Some(href)) => href,
        };

        let target = self
            .url
            .join(&href)
            .map_err(|e| RenderError::InvalidUrl(format!("{href}: {e}")))?;
        if same_document(&target, &self.url) {
            return Err(RenderError::NotClickable {
                selector: element.selector.clone(),
                index: element.index,
                reason: format!("link '{href}' points back to the current page"),
            });
        }
        log::debug!("Following {} from {}", target, self.url);
        let fragment = fetch_within(&self.client, &target, self.interaction_timeout).await?;
        self.splice(&fragment);
        Ok(())
    }

    /// The document only changes through `click`, so the answer is known
    /// on the first check.
    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), RenderError> {
        let parsed = parse_css(selector)?;
        if count_matches(&self.html, &parsed) > 0 {
            Ok(())
        } else {
            Err(RenderError::Timeout {
                selector: selector.to_string(),
                timeout_ms: 0,
            })
        }
    }
}

async fn fetch(client: &Client, url: &Url) -> Result<String, RenderError> {
    send(client.get(url.clone()), url).await
}

/// Fetch content loaded by an interaction, bounded by its own timeout.
async fn fetch_within(client: &Client, url: &Url, timeout: Duration) -> Result<String, RenderError> {
    send(client.get(url.clone()).timeout(timeout), url).await
}

async fn send(request: RequestBuilder, url: &Url) -> Result<String, RenderError> {
    log::debug!("Fetching: {}", url);
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(RenderError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}

fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

fn parse_css(selector: &str) -> Result<Selector, RenderError> {
    Selector::parse(selector).map_err(|e| RenderError::InvalidSelector(format!("{selector}: {e}")))
}

fn count_matches(html: &str, selector: &Selector) -> usize {
    Html::parse_document(html).select(selector).count()
}

/// `None` when the element no longer exists, `Some(None)` when it has no href.
fn element_href(html: &str, selector: &Selector, index: usize) -> Option<Option<String>> {
    let document = Html::parse_document(html);
    let element = document.select(selector).nth(index)?;
    Some(element.value().attr("href").map(str::to_string))
}
