//! MCP server implementation.

use super::protocol::*;
use crate::config::Settings;
use crate::error::ToolError;
use crate::session::SessionState;
use crate::tools::{parse_tool_arguments, tool_definitions, ToolResponse, Toolbox};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server for one conversation.
pub struct McpServer {
    toolbox: Toolbox,
    state: SessionState,
    meta: SessionMeta,
}

impl McpServer {
    pub fn new(toolbox: Toolbox, meta: SessionMeta) -> Self {
        Self {
            toolbox,
            state: SessionState::new(),
            meta,
        }
    }

    /// Build the toolbox from settings. A session id is generated when none
    /// is configured.
    pub fn from_settings(settings: &Settings) -> crate::error::Result<Self> {
        let toolbox = Toolbox::from_settings(settings)?;
        let agent = &settings.agent;
        let meta = SessionMeta {
            app_name: agent.app_name.clone(),
            user_id: agent.user_id.clone(),
            session_id: agent
                .session_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            model: agent.model.clone(),
        };
        Ok(Self::new(toolbox, meta))
    }

    pub fn session(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve line-delimited JSON-RPC from `reader` until end of input.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(
            "{} tool server starting (session {}, user {})",
            self.meta.app_name, self.meta.session_id, self.meta.user_id
        );

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"))
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle a single JSON-RPC request. Notifications get no response.
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Received {}", request.method);
        let is_notification = request.id.is_none();

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "initialized" | "notifications/initialized" => return None,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        };

        // Notifications never get a response
        if is_notification {
            return None;
        }
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: self.meta.app_name.clone(),
                version: SERVER_VERSION.to_string(),
            },
            meta: self.meta.clone(),
        };

        JsonRpcResponse::from_serializable(id, &result)
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: tool_definitions(),
        };
        JsonRpcResponse::from_serializable(id, &result)
    }

    async fn handle_tools_call(
        &mut self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    let message = format!("Invalid params: {}", e);
                    return JsonRpcResponse::error(id, INVALID_PARAMS, &message);
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let arguments = params.arguments.unwrap_or(Value::Null);
        let result = match parse_tool_arguments(&params.name, &arguments) {
            Ok(call) => {
                let response = self.toolbox.execute(&call, &mut self.state).await;
                envelope_result(&response)
            }
            Err(e) => {
                warn!("Rejected tool call {}: {}", params.name, e);
                envelope_result(&ToolResponse::error(ToolError::validation(e.to_string())))
            }
        };

        JsonRpcResponse::from_serializable(id, &result)
    }
}

/// Envelope JSON as text content, flagged when it is an error.
fn envelope_result(response: &ToolResponse) -> ToolCallResult {
    let text = response.to_value().to_string();
    if response.is_error() {
        ToolCallResult::error(text)
    } else {
        ToolCallResult::text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DatabaseTools;

    fn server(dir: &std::path::Path) -> McpServer {
        let mut settings = Settings::default();
        settings.geocoding.base_url = "http://127.0.0.1:9".to_string();
        settings.agent.session_id = Some("session-1".to_string());

        let mut server = McpServer::from_settings(&settings).unwrap();
        server.toolbox = Toolbox::from_settings(&settings)
            .unwrap()
            .with_database(DatabaseTools::new("sqlite_db.db").with_base_dir(dir));
        server
    }

    fn content_text(response: &Value) -> &str {
        response["result"]["content"][0]["text"].as_str().unwrap()
    }

    async fn exchange(server: &mut McpServer, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = server(dir.path());

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let responses = exchange(&mut server, input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(responses[0]["result"]["_meta"]["sessionId"], "session-1");
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 14);
        assert!(responses[1]["result"]["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = server(dir.path());

        let input = concat!(
            "this is not json\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call"}"#,
            "\n"
        );
        let responses = exchange(&mut server, input).await;

        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[1]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses[1]["id"], 7);
        assert_eq!(responses[2]["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = server(dir.path());

        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"tools/call"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#,
            "\n"
        );
        let responses = exchange(&mut server, input).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 9);
        assert!(responses[0]["error"].is_null());
    }

    #[tokio::test]
    async fn test_tool_calls_share_session_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = server(dir.path());

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"set_temperature_unit","arguments":{"unit":"fahrenheit"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"set_db_path","arguments":{"db_path":"notes.db"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"recall","arguments":{"key":"nothing"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"remember","arguments":{"key":"k"}}}"#,
            "\n"
        );
        let responses = exchange(&mut server, input).await;

        let first: Value =
            serde_json::from_str(content_text(&responses[0])).unwrap();
        assert_eq!(first["status"], "success");
        assert!(responses[0]["result"].get("isError").is_none());

        assert_eq!(
            server.state().sqlite_db_path.as_deref(),
            Some(dir.path().join("notes.db").as_path())
        );
        assert_eq!(
            server.state().user_preference_temperature_unit,
            crate::session::TemperatureUnit::Fahrenheit
        );

        assert_eq!(responses[2]["result"]["isError"], true);
        let missing: Value =
            serde_json::from_str(content_text(&responses[2])).unwrap();
        assert_eq!(missing["error_kind"], "not_found");

        assert_eq!(responses[3]["result"]["isError"], true);
        let invalid: Value =
            serde_json::from_str(content_text(&responses[3])).unwrap();
        assert_eq!(invalid["error_kind"], "validation");
        assert!(invalid["error_message"].as_str().unwrap().contains("'value'"));
    }

    #[test]
    fn test_generated_session_id() {
        let server = McpServer::from_settings(&Settings::default()).unwrap();
        assert!(uuid::Uuid::parse_str(&server.session().session_id).is_ok());
    }
}
