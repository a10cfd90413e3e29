//! Book catalog search backed by the Google Books volumes API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use readlist_kernel::settings::SearchSettings;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const USER_AGENT: &str = concat!("readlist/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request details forwarded to the catalog.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    pub request_id: Option<String>,
}

/// Raw catalog answer. Items stay untyped so one bad entry cannot sink the batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub items: Option<Vec<serde_json::Value>>,
}

#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(&self, term: &str, ctx: &SearchContext) -> anyhow::Result<CatalogResponse>;
}

pub struct GoogleBooksClient {
    client: reqwest::Client,
    api_url: String,
    max_results: u32,
    api_key: Option<SecretString>,
}

impl GoogleBooksClient {
    pub fn new(settings: &SearchSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build catalog HTTP client")?;

        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            max_results: settings.max_results,
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl CatalogSearch for GoogleBooksClient {
    async fn search(&self, term: &str, ctx: &SearchContext) -> anyhow::Result<CatalogResponse> {
        if term.trim().is_empty() {
            return Ok(CatalogResponse::default());
        }

        let max_results = self.max_results.to_string();
        let mut request = self
            .client
            .get(&self.api_url)
            .query(&[("q", term), ("maxResults", max_results.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.expose_secret())]);
        }

        tracing::debug!(
            term,
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            "querying book catalog"
        );

        let response = request
            .send()
            .await
            .context("catalog request failed")?
            .error_for_status()
            .context("catalog returned an error status")?;

        response
            .json::<CatalogResponse>()
            .await
            .context("catalog response is not valid JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_items_deserialize_to_none() {
        let response: CatalogResponse =
            serde_json::from_str(r#"{"kind": "books#volumes", "totalItems": 0}"#).unwrap();
        assert!(response.items.is_none());
    }

    #[test]
    fn items_keep_malformed_entries() {
        let response: CatalogResponse =
            serde_json::from_str(r#"{"items": [{"id": "a"}, 42, null]}"#).unwrap();
        assert_eq!(response.items.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_term_skips_the_network() {
        let settings = SearchSettings {
            api_url: "http://127.0.0.1:1/unreachable".to_string(),
            ..SearchSettings::default()
        };
        let client = GoogleBooksClient::new(&settings).unwrap();
        let response = client.search("  ", &SearchContext::default()).await.unwrap();
        assert!(response.items.is_none());
    }
}
