//! Tool calls exposed to the agent dispatcher.
//!
//! A dispatcher names a tool and hands over JSON arguments. [`parse_tool_call`]
//! turns that into a typed [`ToolCall`], [`Toolbox::execute`] runs it against
//! the conversation's [`SessionState`](crate::session::SessionState) and
//! [`ToolResponse`] is what goes back over the wire.

mod definitions;
mod response;
mod toolbox;

pub use definitions::{tool_definitions, ToolDefinition};
pub use response::ToolResponse;
pub use toolbox::Toolbox;

use crate::error::{Result, RiggingError};
use serde_json::Value;

/// Available tools.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Search the web.
    SearchWeb { query: String },

    /// Current weather for a city, in the session's preferred unit.
    GetWeather { city: String },

    /// Change the session's preferred temperature unit.
    SetTemperatureUnit { unit: String },

    /// Store a fact in the notebook.
    Remember { key: String, value: String },

    /// Fetch a fact from the notebook.
    Recall { key: String },

    /// Remove a fact from the notebook.
    Forget { key: String },

    /// List notebook keys.
    ListMemories,

    /// Point the session at a SQLite file.
    SetDbPath { db_path: String },

    /// Create a SQLite file and point the session at it.
    CreateDatabase { db_path: String },

    /// Run a CREATE TABLE statement.
    CreateTable { query: String },

    /// Run a non-SELECT statement.
    WriteQuery { query: String },

    /// Run a SELECT statement.
    ReadQuery { query: String },

    /// List tables in the session's database.
    ListTables,

    /// Column metadata for a table.
    DescribeTable { table_name: String },
}

impl ToolCall {
    /// Wire name of the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::SearchWeb { .. } => "search_web",
            ToolCall::GetWeather { .. } => "get_weather",
            ToolCall::SetTemperatureUnit { .. } => "set_temperature_unit",
            ToolCall::Remember { .. } => "remember",
            ToolCall::Recall { .. } => "recall",
            ToolCall::Forget { .. } => "forget",
            ToolCall::ListMemories => "list_memories",
            ToolCall::SetDbPath { .. } => "set_db_path",
            ToolCall::CreateDatabase { .. } => "create_database",
            ToolCall::CreateTable { .. } => "create_table",
            ToolCall::WriteQuery { .. } => "write_query",
            ToolCall::ReadQuery { .. } => "read_query",
            ToolCall::ListTables => "list_tables",
            ToolCall::DescribeTable { .. } => "describe_table",
        }
    }
}

/// Parse a tool call from its name and JSON-encoded arguments.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: Value = if arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| RiggingError::InvalidToolCall(format!("Invalid tool arguments: {}", e)))?
    };

    parse_tool_arguments(name, &args)
}

/// Parse a tool call from its name and already-decoded arguments.
pub fn parse_tool_arguments(name: &str, args: &Value) -> Result<ToolCall> {
    if !(args.is_object() || args.is_null()) {
        return Err(RiggingError::InvalidToolCall(
            "Tool arguments must be a JSON object".to_string(),
        ));
    }

    match name {
        "search_web" => Ok(ToolCall::SearchWeb {
            query: string_arg(args, "query")?,
        }),
        "get_weather" => Ok(ToolCall::GetWeather {
            city: string_arg(args, "city")?,
        }),
        "set_temperature_unit" => Ok(ToolCall::SetTemperatureUnit {
            unit: string_arg(args, "unit")?,
        }),
        "remember" => Ok(ToolCall::Remember {
            key: string_arg(args, "key")?,
            value: string_arg(args, "value")?,
        }),
        "recall" => Ok(ToolCall::Recall {
            key: string_arg(args, "key")?,
        }),
        "forget" => Ok(ToolCall::Forget {
            key: string_arg(args, "key")?,
        }),
        "list_memories" => Ok(ToolCall::ListMemories),
        "set_db_path" => Ok(ToolCall::SetDbPath {
            db_path: string_arg(args, "db_path")?,
        }),
        "create_database" => Ok(ToolCall::CreateDatabase {
            db_path: string_arg(args, "db_path")?,
        }),
        "create_table" => Ok(ToolCall::CreateTable {
            query: string_arg(args, "query")?,
        }),
        "write_query" => Ok(ToolCall::WriteQuery {
            query: string_arg(args, "query")?,
        }),
        "read_query" => Ok(ToolCall::ReadQuery {
            query: string_arg(args, "query")?,
        }),
        "list_tables" => Ok(ToolCall::ListTables),
        "describe_table" => Ok(ToolCall::DescribeTable {
            table_name: string_arg(args, "table_name")?,
        }),
        _ => Err(RiggingError::UnknownTool(name.to_string())),
    }
}

fn string_arg(args: &Value, field: &str) -> Result<String> {
    match &args[field] {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Err(RiggingError::InvalidToolCall(format!(
            "Missing '{}' argument",
            field
        ))),
        _ => Err(RiggingError::InvalidToolCall(format!(
            "Argument '{}' must be a string",
            field
        ))),
    }
}
