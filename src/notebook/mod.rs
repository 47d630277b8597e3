//! Key-value notebook the agent uses to remember facts.
//!
//! Provides a trait-based interface so the owner decides where notes live and
//! for how long.

mod memory;

pub use memory::MemoryNotebook;

use crate::error::ToolResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookEntry {
    pub value: String,
    pub stored_at: DateTime<Utc>,
}

/// Trait for notebook storage backends.
pub trait NotebookStore: Send + Sync {
    /// Store a value, replacing any previous value for the key.
    fn store(&self, key: &str, value: &str) -> ToolResult<()>;

    /// Fetch the entry for a key. Absent keys are a `NotFound` error.
    fn retrieve(&self, key: &str) -> ToolResult<NotebookEntry>;

    /// Remove a key. Absent keys are a `NotFound` error.
    fn forget(&self, key: &str) -> ToolResult<()>;

    /// All keys, sorted.
    fn keys(&self) -> ToolResult<Vec<String>>;
}
