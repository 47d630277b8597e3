//! Tools command implementation.

use crate::tools::tool_definitions;
use anyhow::Result;

/// Print the tool catalog.
pub fn run_tools() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&tool_definitions())?);
    Ok(())
}
