//! In-memory notebook.
//!
//! Lives as long as its owner; nothing is written to disk.

use super::{NotebookEntry, NotebookStore};
use crate::error::{ToolError, ToolResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory notebook.
pub struct MemoryNotebook {
    entries: RwLock<HashMap<String, NotebookEntry>>,
}

impl MemoryNotebook {
    /// Create an empty notebook.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryNotebook {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> ToolError {
    ToolError::internal(format!("Failed to acquire notebook lock: {}", e))
}

fn missing(key: &str) -> ToolError {
    ToolError::not_found(format!("No value stored for key '{}'", key))
}

impl NotebookStore for MemoryNotebook {
    fn store(&self, key: &str, value: &str) -> ToolResult<()> {
        if key.trim().is_empty() {
            return Err(ToolError::validation("Key cannot be empty"));
        }

        let mut entries = self.entries.write().map_err(lock_error)?;
        entries.insert(
            key.to_string(),
            NotebookEntry {
                value: value.to_string(),
                stored_at: Utc::now(),
            },
        );
        debug!("Stored note '{}'", key);
        Ok(())
    }

    fn retrieve(&self, key: &str) -> ToolResult<NotebookEntry> {
        let entries = self.entries.read().map_err(lock_error)?;
        entries.get(key).cloned().ok_or_else(|| missing(key))
    }

    fn forget(&self, key: &str) -> ToolResult<()> {
        let mut entries = self.entries.write().map_err(lock_error)?;
        entries.remove(key).map(|_| ()).ok_or_else(|| missing(key))
    }

    fn keys(&self) -> ToolResult<Vec<String>> {
        let entries = self.entries.read().map_err(lock_error)?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
