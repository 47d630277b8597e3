//! Serper backend.

use super::{decode, request_error, require_key, ResponseKeys, SearchBackend};
use crate::error::ToolResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

pub struct SerperBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SerperBackend {
    pub const KEYS: ResponseKeys = ResponseKeys {
        organic: "organic",
        answer_box: "answerBox",
        knowledge_graph: "knowledgeGraph",
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
impl SearchBackend for SerperBackend {
    fn name(&self) -> &'static str {
        "serper"
    }

    fn keys(&self) -> ResponseKeys {
        Self::KEYS
    }

    #[instrument(skip(self))]
    async fn fetch(&self, query: &str) -> ToolResult<Value> {
        let api_key = require_key(self.api_key.as_deref(), "SERPER_API_KEY")?;

        let url = format!("{}/search", self.base_url);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query }))
            .send()
            .await
            .map_err(request_error)?;

        decode(response).await
    }
}
