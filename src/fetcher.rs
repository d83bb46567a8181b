//! Page fetching: the [`PageFetcher`] trait and the built-in HTTP implementation
//!
//! The engine consumes fetchers through the trait only, one invocation
//! per attempt; it places no constraints on the implementation beyond
//! that. [`HttpPageFetcher`] is the built-in implementation: one GET per
//! attempt, then title and outbound links extracted from the body.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use crate::error::{FetchError, Result};
use crate::types::{PageData, ResourceId};

/// Default request timeout for [`HttpPageFetcher`]
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("scrape-pool/", env!("CARGO_PKG_VERSION"));

/// Performs one fetch attempt for a resource identifier
///
/// Implementations may fail for any transient or permanent reason; the
/// engine treats all [`FetchError`] values uniformly under the flat
/// retry policy. A fetch must have no side effects visible to the
/// engine other than its return value.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Perform one fetch attempt for `id`
    async fn fetch(&self, id: &ResourceId) -> std::result::Result<PageData, FetchError>;
}

/// Fetches pages over HTTP and extracts the title and outbound links
///
/// Treats the resource identifier as a URL. Non-success statuses are
/// reported as [`FetchError::Status`] so the retry loop sees them the
/// same way it sees transport failures.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with the default request timeout (30 seconds)
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a fetcher with a custom per-request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Network)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, id: &ResourceId) -> std::result::Result<PageData, FetchError> {
        let url = Url::parse(id.as_str())
            .map_err(|e| FetchError::Parse(format!("invalid URL '{}': {}", id, e)))?;

        tracing::debug!(url = %url, "fetching page");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: id.to_string(),
            });
        }

        let body = response.text().await?;
        extract_page(&body)
    }
}

/// Parse an HTML document into its title and outbound links
///
/// The title is the text of the first `<title>` element (empty if the
/// document has none); links are the raw `href` values of every
/// `<a href>` element in document order.
///
/// This is a synchronous function on purpose: the parsed DOM is not
/// `Send` and must never be held across an await point.
pub fn extract_page(html: &str) -> std::result::Result<PageData, FetchError> {
    let document = Html::parse_document(html);

    let title_selector =
        Selector::parse("title").map_err(|e| FetchError::Parse(e.to_string()))?;
    let link_selector =
        Selector::parse("a[href]").map_err(|e| FetchError::Parse(e.to_string()))?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let links = document
        .select(&link_selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::to_string)
        .collect();

    Ok(PageData { title, links })
}
