//! Rigging - tool services for LLM agents
//!
//! The functions an agent dispatcher calls on a model's behalf: web search,
//! current weather, a key-value notebook and SQLite access. Each call runs
//! against a per-conversation [`session::SessionState`] and reports either a
//! payload or a typed [`ToolError`].
//!
//! # Architecture
//!
//! - `config` - TOML settings with environment overrides
//! - `geocoding` - place name to coordinates, cached, with a static fallback
//! - `weather` - current conditions in the session's preferred unit
//! - `notebook` - key-value facts behind a storage trait
//! - `store` - SQLite files keyed by path, with statement validation
//! - `search` - SerpAPI / Serper web search
//! - `tools` - typed tool calls, JSON-schema catalog and dispatch
//! - `mcp` - JSON-RPC 2.0 stdio server exposing the tools
//!
//! # Example
//!
//! ```rust,no_run
//! use rigging::config::Settings;
//! use rigging::session::SessionState;
//! use rigging::tools::{parse_tool_call, Toolbox};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let toolbox = Toolbox::from_settings(&settings)?;
//!     let mut state = SessionState::new();
//!
//!     let call = parse_tool_call("get_weather", r#"{"city": "London"}"#)?;
//!     let response = toolbox.execute(&call, &mut state).await;
//!     println!("{}", response.to_value());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod mcp;
pub mod notebook;
pub mod search;
pub mod session;
pub mod store;
pub mod tools;
pub mod weather;

pub use error::{Result, RiggingError, ToolError, ToolErrorKind, ToolResult};
