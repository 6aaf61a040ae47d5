//! Catalog search client
//!
//! The catalog exposes a paginated search endpoint; [`CatalogClient`] is the
//! seam the manifest builder works against, and [`ScryfallClient`] is the
//! real implementation over `/cards/search`. Every page fetch goes through
//! the retry layer, and a courtesy delay is slept after each successful page
//! so a big collection does not hammer the host.

use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::retry::download_with_retry;
use crate::types::CardRecord;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// One page of catalog search results
#[derive(Clone, Debug)]
pub struct CatalogPage {
    /// Records on this page, in catalog order
    pub records: Vec<CardRecord>,
    /// Whether another page follows this one
    pub has_more: bool,
}

/// Source of paginated card records for one collection
///
/// The manifest builder drives this trait page by page; implementations
/// handle transport, retry and pacing. Page numbers start at 1.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch page `page` of the records for `collection`
    ///
    /// Returns [`Error::NotFound`] when the catalog has no results for the
    /// query at all (the builder treats this on page 1 as an empty
    /// collection) and [`Error::Status`] for other non-success responses.
    async fn fetch_page(&self, collection: &str, page: u32) -> Result<CatalogPage>;
}

/// Wire shape of a search response (only the fields the pipeline reads)
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<CardRecord>,
    #[serde(default)]
    has_more: bool,
}

/// HTTP catalog client over the Scryfall-style search API
#[derive(Debug)]
pub struct ScryfallClient {
    client: reqwest::Client,
    base_url: Url,
    config: CatalogConfig,
}

impl ScryfallClient {
    /// Build a client from configuration
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid catalog base URL '{}': {e}", config.base_url),
            key: Some("base_url".to_string()),
        })?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn page_url(&self, collection: &str, page: u32) -> Result<Url> {
        let mut url = self.base_url.join("/cards/search").map_err(|e| Error::Config {
            message: format!("cannot build search URL: {e}"),
            key: Some("base_url".to_string()),
        })?;
        url.query_pairs_mut()
            .append_pair("q", &format!("e:{collection}"))
            .append_pair("unique", "prints")
            .append_pair("include_extras", "true")
            .append_pair("include_variations", "true")
            .append_pair("order", "set")
            .append_pair("dir", "asc")
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn fetch_page_once(&self, collection: &str, page: u32) -> Result<CatalogPage> {
        let url = self.page_url(collection, page)?;
        tracing::debug!(%collection, page, "fetching catalog page");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "no catalog results for collection '{collection}' (page {page})"
            )));
        }
        if !status.is_success() {
            return Err(Error::Status {
                code: status.as_u16(),
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(CatalogPage {
            records: body.data,
            has_more: body.has_more,
        })
    }
}

#[async_trait]
impl CatalogClient for ScryfallClient {
    async fn fetch_page(&self, collection: &str, page: u32) -> Result<CatalogPage> {
        let result = download_with_retry(&self.config.retry, || {
            self.fetch_page_once(collection, page)
        })
        .await?;

        // Pace page requests as the host asks; retries have their own backoff
        if !self.config.page_delay.is_zero() {
            tokio::time::sleep(self.config.page_delay).await;
        }

        Ok(result)
    }
}
