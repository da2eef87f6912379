//! Web search client (Bing Web Search v7 wire shape)
//!
//! Optional: without a credential the client reports itself unconfigured and
//! competitor discovery runs on model suggestions alone.

use async_trait::async_trait;
use bpa_common::config::SearchConfig;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::types::{SearchError, WebSearch};
use crate::utils::{retry, RetryPolicy};

/// Results kept per query
const MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "webPages", default)]
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
struct WebPages {
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
struct WebPage {
    name: String,
}

pub struct BingSearch {
    http_client: reqwest::Client,
    endpoint: String,
    market: String,
    api_key: Option<String>,
}

impl fmt::Debug for BingSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BingSearch")
            .field("endpoint", &self.endpoint)
            .field("market", &self.market)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl BingSearch {
    pub fn new(config: &SearchConfig, api_key: Option<String>) -> Result<Self, SearchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| SearchError::Unavailable(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            market: config.market.clone(),
            api_key: api_key.filter(|k| bpa_common::config::is_valid_key(k)),
        })
    }
}

/// Page titles carry site suffixes ("Acme - Booking | acme.se"); keep the lead
pub fn clean_title(title: &str) -> String {
    let cut = [" - ", " | ", " – ", " — "]
        .iter()
        .filter_map(|sep| title.find(sep))
        .min()
        .unwrap_or(title.len());
    title[..cut].trim().to_string()
}

impl BingSearch {
    /// One request to the search endpoint
    async fn query(&self, api_key: &str, query: &str) -> Result<Vec<String>, SearchError> {
        let count = MAX_RESULTS.to_string();

        let response = self
            .http_client
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .query(&[
                ("q", query),
                ("mkt", self.market.as_str()),
                ("count", count.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Unavailable(format!("status {}", status.as_u16())));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            SearchError::Unavailable(format!("unreadable response: {}", e.without_url()))
        })?;

        let names = body
            .web_pages
            .map(|pages| pages.value)
            .unwrap_or_default()
            .into_iter()
            .map(|page| clean_title(&page.name))
            .filter(|name| !name.is_empty())
            .take(MAX_RESULTS)
            .collect::<Vec<_>>();

        tracing::debug!(results = names.len(), "Web search completed");
        Ok(names)
    }
}

#[async_trait]
impl WebSearch for BingSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::NotConfigured)?;
        retry("web_search", &RetryPolicy::none(), SearchError::is_retryable, || {
            self.query(api_key, query)
        })
        .await
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
