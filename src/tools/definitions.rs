//! JSON-schema catalog of the tools.

use serde::Serialize;
use serde_json::{json, Value};

/// Tool name, description and argument schema as advertised to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn string_params(params: &[(&str, &str)]) -> Value {
    let properties: serde_json::Map<String, Value> = params
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({ "type": "string", "description": description }),
            )
        })
        .collect();
    let required: Vec<&str> = params.iter().map(|(name, _)| *name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// All available tools.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "search_web",
            "Search the web and return the top results, plus a featured answer or \
             knowledge graph summary when the search engine provides one.",
            string_params(&[("query", "The search query")]),
        ),
        tool(
            "get_weather",
            "Get the current weather for a city. Uses the temperature unit the user \
             prefers and remembers the city as the last one checked.",
            string_params(&[("city", "City name, optionally with state or country")]),
        ),
        tool(
            "set_temperature_unit",
            "Set the user's preferred temperature unit for weather reports.",
            json!({
                "type": "object",
                "properties": {
                    "unit": {
                        "type": "string",
                        "enum": ["Celsius", "Fahrenheit"],
                        "description": "Celsius or Fahrenheit (case-insensitive)"
                    }
                },
                "required": ["unit"]
            }),
        ),
        tool(
            "remember",
            "Store a fact under a key so it can be recalled later in the conversation. \
             Overwrites any previous value for the key.",
            string_params(&[("key", "Name to store the fact under"), ("value", "The fact")]),
        ),
        tool(
            "recall",
            "Retrieve a fact previously stored with remember.",
            string_params(&[("key", "Name the fact was stored under")]),
        ),
        tool(
            "forget",
            "Remove a stored fact.",
            string_params(&[("key", "Name the fact was stored under")]),
        ),
        tool(
            "list_memories",
            "List the keys of all stored facts.",
            json!({ "type": "object", "properties": {}, "required": [] }),
        ),
        tool(
            "set_db_path",
            "Choose the SQLite database file used by the other database tools. \
             Relative paths are resolved against the working directory and missing \
             directories are created.",
            string_params(&[("db_path", "Path to the database file")]),
        ),
        tool(
            "create_database",
            "Create a SQLite database file (if needed) and use it for the other \
             database tools.",
            string_params(&[("db_path", "Path to the database file")]),
        ),
        tool(
            "create_table",
            "Create a table. Only CREATE TABLE statements are accepted.",
            string_params(&[("query", "The CREATE TABLE statement")]),
        ),
        tool(
            "write_query",
            "Run an INSERT, UPDATE, DELETE or other modifying statement and return \
             the number of affected rows. SELECT statements are rejected.",
            string_params(&[("query", "The SQL statement")]),
        ),
        tool(
            "read_query",
            "Run a SELECT statement and return every row.",
            string_params(&[("query", "The SELECT statement")]),
        ),
        tool(
            "list_tables",
            "List the tables in the current database.",
            json!({ "type": "object", "properties": {}, "required": [] }),
        ),
        tool(
            "describe_table",
            "Show the columns of a table: name, type, nullability, default and \
             primary key membership.",
            string_params(&[("table_name", "Name of the table")]),
        ),
    ]
}
