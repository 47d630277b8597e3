//! SQLite tools operating on the session's configured database.
//!
//! [`DatabaseTools`] resolves which file a session talks to, validates SQL by
//! its leading keyword, and converts every failure into a [`ToolError`].

mod sqlite;
mod statement;

pub use sqlite::{ColumnInfo, Row, SqliteStore, StoreRegistry};
pub use statement::{StatementKind, CREATE_TABLE_ALLOWED, READ_ALLOWED, WRITE_ALLOWED};

use crate::error::{ToolError, ToolResult};
use crate::session::SessionState;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct PathConfigured {
    pub message: String,
    pub absolute_path: PathBuf,
    pub working_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseCreated {
    pub message: String,
    pub absolute_path: PathBuf,
    pub working_directory: PathBuf,
    pub sqlite_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableCreated {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub affected_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadOutcome {
    pub data: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableList {
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub table: String,
    pub schema: Vec<ColumnInfo>,
}

/// SQLite tools with their own handle registry.
pub struct DatabaseTools {
    registry: StoreRegistry,
    default_path: String,
    base_dir: Option<PathBuf>,
}

impl DatabaseTools {
    /// `default_path` is used by sessions that never configured a database.
    pub fn new(default_path: impl Into<String>) -> Self {
        Self {
            registry: StoreRegistry::new(),
            default_path: default_path.into(),
            base_dir: None,
        }
    }

    /// Resolve relative paths against `dir` instead of the process working
    /// directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    fn base_dir(&self) -> ToolResult<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().map_err(|e| {
                ToolError::configuration(format!("Cannot determine working directory: {}", e))
            }),
        }
    }

    /// Turn a user-supplied path into an absolute one.
    pub fn resolve_path(&self, raw: &str) -> ToolResult<PathBuf> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ToolError::validation("Database path cannot be empty"));
        }

        let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
        if expanded.is_absolute() {
            Ok(expanded)
        } else {
            Ok(self.base_dir()?.join(expanded))
        }
    }

    fn active_store(&self, state: &SessionState) -> ToolResult<Arc<SqliteStore>> {
        let path = match &state.sqlite_db_path {
            Some(path) => path.clone(),
            None => self.resolve_path(&self.default_path)?,
        };
        self.registry.get_or_open(&path)
    }

    /// Point the session at a database file, creating it if needed.
    #[instrument(skip(self, state))]
    pub fn configure_path(
        &self,
        path: &str,
        state: &mut SessionState,
    ) -> ToolResult<PathConfigured> {
        let full_path = self.resolve_path(path)?;
        let working_directory = self.base_dir()?;

        self.registry.get_or_open(&full_path)?;
        state.sqlite_db_path = Some(full_path.clone());

        info!(
            "Database path set to {} (working dir: {})",
            full_path.display(),
            working_directory.display()
        );

        Ok(PathConfigured {
            message: format!("Database path set to {}", full_path.display()),
            absolute_path: full_path,
            working_directory,
        })
    }

    /// Like [`configure_path`](Self::configure_path), then confirms the file
    /// exists and reports the SQLite version.
    #[instrument(skip(self, state))]
    pub fn create_database(
        &self,
        path: &str,
        state: &mut SessionState,
    ) -> ToolResult<DatabaseCreated> {
        let configured = self.configure_path(path, state)?;

        if !configured.absolute_path.exists() {
            return Err(ToolError::storage(format!(
                "Database file was not created at {}",
                configured.absolute_path.display()
            )));
        }

        let store = self.registry.get_or_open(&configured.absolute_path)?;
        let version = store.sqlite_version().map_err(|e| {
            ToolError::storage(format!("Database file exists but cannot be opened: {}", e))
        })?;

        info!(
            "Database created at {} (SQLite version: {})",
            configured.absolute_path.display(),
            version
        );

        Ok(DatabaseCreated {
            message: format!("Database created at {}", configured.absolute_path.display()),
            absolute_path: configured.absolute_path,
            working_directory: configured.working_directory,
            sqlite_version: version,
        })
    }

    /// Run a `CREATE TABLE` statement.
    pub fn create_table(&self, sql: &str, state: &SessionState) -> ToolResult<TableCreated> {
        require(sql, CREATE_TABLE_ALLOWED, "Only CREATE TABLE statements are allowed")?;
        self.active_store(state)?.execute(sql)?;
        Ok(TableCreated {
            message: "Table created successfully".to_string(),
        })
    }

    /// Run any statement that does not start with SELECT.
    pub fn write(&self, sql: &str, state: &SessionState) -> ToolResult<WriteOutcome> {
        require(sql, WRITE_ALLOWED, "SELECT queries are not allowed for write_query")?;
        let affected_rows = self.active_store(state)?.execute(sql)?;
        Ok(WriteOutcome { affected_rows })
    }

    /// Run a SELECT statement.
    pub fn read(&self, sql: &str, state: &SessionState) -> ToolResult<ReadOutcome> {
        require(sql, READ_ALLOWED, "Only SELECT queries are allowed for read_query")?;
        let data = self.active_store(state)?.query(sql)?;
        Ok(ReadOutcome { data })
    }

    pub fn list_tables(&self, state: &SessionState) -> ToolResult<TableList> {
        let tables = self.active_store(state)?.list_tables()?;
        Ok(TableList { tables })
    }

    pub fn describe_table(&self, table: &str, state: &SessionState) -> ToolResult<TableSchema> {
        let schema = self.active_store(state)?.table_columns(table)?;
        if schema.is_empty() {
            return Err(ToolError::not_found(format!("Table '{}' does not exist", table)));
        }
        Ok(TableSchema {
            table: table.to_string(),
            schema,
        })
    }

    /// Path the session currently operates on, if resolvable.
    pub fn active_path(&self, state: &SessionState) -> Option<PathBuf> {
        state
            .sqlite_db_path
            .clone()
            .or_else(|| self.resolve_path(&self.default_path).ok())
    }
}

fn require(sql: &str, allowed: &[StatementKind], message: &str) -> ToolResult<()> {
    match StatementKind::classify(sql) {
        StatementKind::Empty => Err(ToolError::validation("SQL statement cannot be empty")),
        kind if kind.is_allowed(allowed) => Ok(()),
        _ => Err(ToolError::validation(message)),
    }
}
