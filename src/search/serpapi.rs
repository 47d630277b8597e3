//! SerpAPI backend.

use super::{decode, request_error, require_key, ResponseKeys, SearchBackend};
use crate::error::ToolResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

pub struct SerpApiBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SerpApiBackend {
    pub const KEYS: ResponseKeys = ResponseKeys {
        organic: "organic_results",
        answer_box: "answer_box",
        knowledge_graph: "knowledge_graph",
    };

    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl SearchBackend for SerpApiBackend {
    fn name(&self) -> &'static str {
        "serpapi"
    }

    fn keys(&self) -> ResponseKeys {
        Self::KEYS
    }

    #[instrument(skip(self))]
    async fn fetch(&self, query: &str) -> ToolResult<Value> {
        let api_key = require_key(self.api_key.as_deref(), "SERPAPI_KEY")?;

        let url = format!("{}/search", self.base_url);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("api_key", api_key.as_str()), ("engine", "google")])
            .send()
            .await
            .map_err(request_error)?;

        decode(response).await
    }
}
