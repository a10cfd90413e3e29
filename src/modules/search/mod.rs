//! Autocomplete proxy in front of the book catalog.

pub mod catalog;
pub mod formatter;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    response::Html,
    routing::get,
    Router,
};
use readlist_kernel::settings::SearchSettings;
use readlist_kernel::{InitCtx, Module};
use serde::Deserialize;
use serde_json::json;

use catalog::{CatalogSearch, GoogleBooksClient, SearchContext};

/// Body the widget reads as "nothing to show".
pub const NO_RESULT: &str = "fail";

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Clone)]
pub struct SearchState {
    catalog: Arc<dyn CatalogSearch>,
    default_thumbnail: Arc<str>,
}

impl SearchState {
    pub fn new(catalog: Arc<dyn CatalogSearch>, default_thumbnail: impl Into<Arc<str>>) -> Self {
        Self {
            catalog,
            default_thumbnail: default_thumbnail.into(),
        }
    }

    /// Concatenated snippets for `term`, or the `fail` sentinel.
    pub async fn query(&self, term: &str, ctx: &SearchContext) -> String {
        let response = match self.catalog.search(term, ctx).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    term,
                    request_id = ctx.request_id.as_deref().unwrap_or("-"),
                    error = ?e,
                    "catalog search failed"
                );
                return NO_RESULT.to_string();
            }
        };

        match response.items.as_deref() {
            Some(items) if !items.is_empty() => {
                formatter::format_results(items, &self.default_thumbnail).collect()
            }
            _ => NO_RESULT.to_string(),
        }
    }
}

pub struct SearchModule {
    state: SearchState,
}

impl SearchModule {
    pub fn new(state: SearchState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for SearchModule {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            catalog = %ctx.settings.search.api_url,
            "search module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(query_books))
            .route("/health", get(health_check))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Search the book catalog for the autocomplete widget",
                        "tags": ["Search"],
                        "parameters": [{
                            "name": "q",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "HTML snippets, one per match, or the literal `fail`",
                                "content": {
                                    "text/html": { "schema": { "type": "string" } }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Search module health check",
                        "tags": ["Search"],
                        "responses": { "200": { "description": "OK" } }
                    }
                }
            }
        }))
    }
}

async fn health_check() -> &'static str {
    "search module is healthy"
}

async fn query_books(
    State(state): State<SearchState>,
    headers: HeaderMap,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Html<String> {
    // An unreadable query string counts as no `q` at all.
    let term = params
        .ok()
        .and_then(|Query(params)| params.q)
        .unwrap_or_default();

    let ctx = SearchContext {
        request_id: headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
    };

    Html(state.query(&term, &ctx).await)
}

pub fn create_module(settings: &SearchSettings) -> anyhow::Result<Arc<dyn Module>> {
    let catalog = GoogleBooksClient::new(settings)?;
    let state = SearchState::new(Arc::new(catalog), settings.default_thumbnail());
    Ok(Arc::new(SearchModule::new(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use super::catalog::CatalogResponse;
    use std::sync::Mutex;
    use tower::ServiceExt;

    const DEFAULT_THUMB: &str = "https://readlist.example/static/img/book-badge.png";

    struct StubCatalog {
        response: serde_json::Value,
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    impl StubCatalog {
        fn new(response: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                response,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CatalogSearch for StubCatalog {
        async fn search(&self, term: &str, ctx: &SearchContext) -> anyhow::Result<CatalogResponse> {
            self.seen
                .lock()
                .unwrap()
                .push((term.to_string(), ctx.request_id.clone()));
            Ok(serde_json::from_value(self.response.clone())?)
        }
    }

    struct DownCatalog;

    #[async_trait]
    impl CatalogSearch for DownCatalog {
        async fn search(&self, _: &str, _: &SearchContext) -> anyhow::Result<CatalogResponse> {
            anyhow::bail!("connection refused")
        }
    }

    async fn get(catalog: Arc<dyn CatalogSearch>, uri: &str) -> (StatusCode, String) {
        let response = SearchModule::new(SearchState::new(catalog, DEFAULT_THUMB))
            .routes()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(REQUEST_ID_HEADER, "req-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn results_are_concatenated_snippets() {
        let catalog = StubCatalog::new(json!({
            "items": [
                {"id": "a", "volumeInfo": {"title": "Dune", "authors": ["Frank Herbert"]}},
                {"id": "b", "volumeInfo": {"title": "No author"}},
                {"id": "c", "volumeInfo": {"title": "Emma", "authors": ["Jane Austen"],
                 "imageLinks": {"smallThumbnail": "http://img/emma.jpg"}}}
            ]
        }));

        let (status, body) = get(catalog.clone(), "/?q=classic+novels").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("searchResWrapper").count(), 2);
        assert!(body.find("Dune (Frank Herbert)").unwrap() < body.find("Emma (Jane Austen)").unwrap());
        assert!(body.contains(&format!("src=\"{}\"", DEFAULT_THUMB)));
        assert!(body.contains("src=\"http://img/emma.jpg\""));

        let seen = catalog.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![("classic novels".to_string(), Some("req-1".to_string()))]
        );
    }

    #[tokio::test]
    async fn no_items_is_fail() {
        for response in [json!({}), json!({"items": []}), json!({"items": null})] {
            let (status, body) = get(StubCatalog::new(response), "/?q=zzz").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, NO_RESULT);
        }
    }

    #[tokio::test]
    async fn missing_query_searches_empty_term() {
        let catalog = StubCatalog::new(json!({}));
        let (_, body) = get(catalog.clone(), "/").await;
        assert_eq!(body, NO_RESULT);
        assert_eq!(catalog.seen.lock().unwrap()[0].0, "");
    }

    #[tokio::test]
    async fn catalog_failure_is_fail() {
        let (status, body) = get(Arc::new(DownCatalog), "/?q=dune").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, NO_RESULT);
    }

    #[tokio::test]
    async fn only_invalid_items_yields_empty_body() {
        let catalog = StubCatalog::new(json!({"items": [{"id": "x"}]}));
        let (_, body) = get(catalog, "/?q=x").await;
        assert_eq!(body, "");
    }
}
