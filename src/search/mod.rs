//! Web search through a hosted Google results API.
//!
//! Two providers are supported, SerpAPI and Serper. Both return the same
//! three sections under different keys, so each backend only knows how to
//! send its request and which keys to read; normalization is shared.

mod serpapi;
mod serper;

pub use serpapi::SerpApiBackend;
pub use serper::SerperBackend;

use crate::config::{SearchProvider, SearchSettings};
use crate::error::{Result, ToolError, ToolResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, instrument};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum organic results returned to the caller.
pub const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedSnippet {
    pub title: String,
    pub answer: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeGraph {
    pub title: String,
    pub description: String,
}

/// Normalized search output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub top_results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_snippet: Option<FeaturedSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<KnowledgeGraph>,
}

/// Where a provider puts each section of its response.
#[derive(Debug, Clone, Copy)]
pub struct ResponseKeys {
    pub organic: &'static str,
    pub answer_box: &'static str,
    pub knowledge_graph: &'static str,
}

/// A search provider.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Response layout used by [`normalize`].
    fn keys(&self) -> ResponseKeys;

    /// Send one query and return the decoded response body.
    async fn fetch(&self, query: &str) -> ToolResult<Value>;
}

/// Web search front end over the configured backend.
pub struct WebSearch {
    backend: Box<dyn SearchBackend>,
}

impl WebSearch {
    pub fn new(backend: Box<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Build the backend selected in settings.
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let backend: Box<dyn SearchBackend> = match settings.provider {
            SearchProvider::SerpApi => Box::new(SerpApiBackend::new(
                client,
                &settings.base_url,
                settings.api_key.clone(),
            )),
            SearchProvider::Serper => Box::new(SerperBackend::new(
                client,
                &settings.serper_base_url,
                settings.serper_api_key.clone(),
            )),
        };

        Ok(Self::new(backend))
    }

    pub fn provider_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Search the web for `query`.
    #[instrument(skip(self), fields(provider = self.backend.name()))]
    pub async fn search(&self, query: &str) -> ToolResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::validation("Search query cannot be empty"));
        }

        let payload = self.backend.fetch(query).await?;
        let results = normalize(query, &payload, self.backend.keys());

        info!(
            "Search for '{}' returned {} results",
            query,
            results.top_results.len()
        );
        Ok(results)
    }
}

/// Collapse a provider response into [`SearchResults`].
///
/// Missing sections are treated as empty; missing string fields become "".
pub fn normalize(query: &str, payload: &Value, keys: ResponseKeys) -> SearchResults {
    let top_results = payload[keys.organic]
        .as_array()
        .map(|items| {
            items
                .iter()
                .take(MAX_RESULTS)
                .map(|item| SearchHit {
                    title: text(item, "title"),
                    link: text(item, "link"),
                    snippet: text(item, "snippet"),
                })
                .collect()
        })
        .unwrap_or_default();

    let featured_snippet = non_empty(&payload[keys.answer_box]).map(|b| FeaturedSnippet {
        title: text(b, "title"),
        answer: text(b, "answer"),
        snippet: text(b, "snippet"),
    });

    let knowledge_graph = non_empty(&payload[keys.knowledge_graph]).map(|kg| KnowledgeGraph {
        title: text(kg, "title"),
        description: text(kg, "description"),
    });

    SearchResults {
        query: query.to_string(),
        top_results,
        featured_snippet,
        knowledge_graph,
    }
}

fn non_empty(value: &Value) -> Option<&Value> {
    value
        .as_object()
        .filter(|obj| !obj.is_empty())
        .map(|_| value)
}

fn text(value: &Value, field: &str) -> String {
    value[field].as_str().unwrap_or_default().to_string()
}

/// Shared response handling for both backends.
pub(crate) async fn decode(response: reqwest::Response) -> ToolResult<Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::transient(format!(
            "Error searching the web: HTTP {}",
            status.as_u16()
        )));
    }

    response
        .json()
        .await
        .map_err(|_| ToolError::data_shape("Error parsing search results."))
}

/// The request URL carries the API key, so it is stripped from the message.
pub(crate) fn request_error(e: reqwest::Error) -> ToolError {
    let e = e.without_url();
    if e.is_timeout() {
        ToolError::transient("Search request timed out.")
    } else {
        ToolError::transient(format!("Error searching the web: {}", e))
    }
}

pub(crate) fn require_key(key: Option<&str>, variable: &str) -> ToolResult<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ToolError::configuration(format!("{} environment variable not set.", variable))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(
        server: &MockServer,
        provider: SearchProvider,
        key: Option<&str>,
    ) -> SearchSettings {
        SearchSettings {
            provider,
            base_url: server.uri(),
            api_key: key.map(str::to_string),
            serper_base_url: server.uri(),
            serper_api_key: key.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_caps_results_and_skips_empty_sections() {
        let organic: Vec<Value> = (0..8)
            .map(|i| json!({"title": format!("r{}", i), "link": format!("https://e.com/{}", i)}))
            .collect();
        let payload = json!({
            "organic_results": organic,
            "answer_box": {},
            "knowledge_graph": {"title": "Rust", "description": "A language"}
        });

        let results = normalize("rust", &payload, SerpApiBackend::KEYS);
        assert_eq!(results.top_results.len(), MAX_RESULTS);
        assert_eq!(results.top_results[4].title, "r4");
        assert_eq!(results.top_results[0].snippet, "");
        assert!(results.featured_snippet.is_none());
        assert_eq!(results.knowledge_graph.as_ref().unwrap().title, "Rust");

        let serialized = serde_json::to_value(&results).unwrap();
        assert!(serialized.get("featured_snippet").is_none());
    }

    #[test]
    fn test_normalize_missing_sections() {
        let results = normalize("nothing", &json!({}), SerperBackend::KEYS);
        assert!(results.top_results.is_empty());
        assert!(results.featured_snippet.is_none());
        assert!(results.knowledge_graph.is_none());
    }

    #[tokio::test]
    async fn test_serpapi_request_and_normalization() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "tallest building"))
            .and(query_param("api_key", "serp-key"))
            .and(query_param("engine", "google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [
                    {
                        "title": "Burj Khalifa",
                        "link": "https://example.com/burj",
                        "snippet": "828 m"
                    }
                ],
                "answer_box": {"title": "Tallest building", "answer": "Burj Khalifa"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let search =
            WebSearch::from_settings(&settings(&server, SearchProvider::SerpApi, Some("serp-key")))
                .unwrap();
        let results = search.search("  tallest building ").await.unwrap();

        assert_eq!(results.query, "tallest building");
        assert_eq!(results.top_results[0].link, "https://example.com/burj");
        let featured = results.featured_snippet.unwrap();
        assert_eq!(featured.answer, "Burj Khalifa");
        assert_eq!(featured.snippet, "");
        assert!(results.knowledge_graph.is_none());
    }

    #[tokio::test]
    async fn test_serper_request_and_normalization() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "serper-key"))
            .and(body_json(json!({"q": "rust language"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    {
                        "title": "Rust",
                        "link": "https://www.rust-lang.org",
                        "snippet": "Reliable software"
                    }
                ],
                "knowledgeGraph": {"title": "Rust", "description": "Programming language"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let search =
            WebSearch::from_settings(&settings(&server, SearchProvider::Serper, Some("serper-key")))
                .unwrap();
        assert_eq!(search.provider_name(), "serper");

        let results = search.search("rust language").await.unwrap();
        assert_eq!(results.top_results.len(), 1);
        assert_eq!(
            results.knowledge_graph.unwrap().description,
            "Programming language"
        );
    }

    #[tokio::test]
    async fn test_missing_key_and_empty_query_make_no_calls() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let search =
            WebSearch::from_settings(&settings(&server, SearchProvider::SerpApi, None)).unwrap();
        let err = search.search("anything").await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Configuration);
        assert!(err.message.contains("SERPAPI_KEY"));

        let search =
            WebSearch::from_settings(&settings(&server, SearchProvider::SerpApi, Some("k")))
                .unwrap();
        let err = search.search("   ").await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_connection_error_does_not_reveal_key() {
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let settings = SearchSettings {
            provider: SearchProvider::SerpApi,
            base_url: uri,
            api_key: Some("SECRET-SERP-KEY".to_string()),
            ..SearchSettings::default()
        };
        let search = WebSearch::from_settings(&settings).unwrap();

        let err = search.search("rust").await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Transient);
        assert!(!err.message.contains("SECRET-SERP-KEY"), "{}", err.message);
        assert!(!err.message.contains("api_key"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_http_failure_and_bad_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("q", "down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let search =
            WebSearch::from_settings(&settings(&server, SearchProvider::SerpApi, Some("k")))
                .unwrap();

        let err = search.search("down").await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Transient);
        assert!(err.message.contains("503"));

        let err = search.search("garbled").await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::DataShape);
    }
}
