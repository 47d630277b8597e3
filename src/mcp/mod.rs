//! MCP (Model Context Protocol) tool server.
//!
//! Exposes the [`Toolbox`](crate::tools::Toolbox) to an agent dispatcher as
//! JSON-RPC 2.0 over stdio. One server process serves one conversation.

mod protocol;
mod server;

pub use protocol::SessionMeta;
pub use server::McpServer;
