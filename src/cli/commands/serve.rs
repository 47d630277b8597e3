//! Serve command implementation.

use crate::config::Settings;
use crate::mcp::McpServer;
use anyhow::Result;

/// Run the MCP tool server until stdin closes.
pub async fn run_serve(settings: Settings) -> Result<()> {
    let mut server = McpServer::from_settings(&settings)?;
    server.run().await
}
