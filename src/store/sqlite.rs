//! SQLite database handles.
//!
//! A [`SqliteStore`] only remembers its file path. Every operation opens its
//! own short-lived connection, so handles are cheap to share.

use crate::error::{ToolError, ToolResult};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// One result row: column name to value, in column order.
pub type Row = Map<String, Value>;

/// Column metadata as reported by `table_info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Handle to a single SQLite database file.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// Missing parent directories are created and the file is verified by
    /// reading its schema, which fails for anything that is not a database.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> ToolResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ToolError::storage(format!(
                    "Failed to create parent directories for {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        let store = Self {
            path: path.to_path_buf(),
        };

        store
            .connect()
            .and_then(|conn| {
                conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
                    row.get::<_, i64>(0)
                })
                    .map_err(ToolError::from)
            })
            .map_err(|e| ToolError::storage(format!("Failed to initialize database: {}", e)))?;

        info!("Database ready at {}", path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> ToolResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Version string of the linked SQLite library.
    pub fn sqlite_version(&self) -> ToolResult<String> {
        let conn = self.connect()?;
        Ok(conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?)
    }

    /// Execute a statement that returns no rows; yields the changed row count.
    #[instrument(skip(self))]
    pub fn execute(&self, sql: &str) -> ToolResult<usize> {
        let conn = self.connect()?;
        let affected = conn.execute(sql, [])?;
        debug!("Statement affected {} rows", affected);
        Ok(affected)
    }

    /// Run a query and collect every row.
    #[instrument(skip(self))]
    pub fn query(&self, sql: &str) -> ToolResult<Vec<Row>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = Row::new();
            for (i, name) in columns.iter().enumerate() {
                map.insert(name.clone(), to_json(row.get_ref(i)?));
            }
            result.push(map);
        }

        debug!("Query returned {} rows", result.len());
        Ok(result)
    }

    /// User tables, excluding SQLite's own `sqlite_sequence`.
    pub fn list_tables(&self) -> ToolResult<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name != 'sqlite_sequence'
            ORDER BY name
            "#,
        )?;

        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(names.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Column metadata for a table. Empty if the table does not exist.
    pub fn table_columns(&self, table: &str) -> ToolResult<Vec<ColumnInfo>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT cid, name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?1)
            ORDER BY cid
            "#,
        )?;

        let columns = stmt.query_map(params![table], |row| {
            Ok(ColumnInfo {
                cid: row.get(0)?,
                name: row.get(1)?,
                declared_type: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                default_value: row.get(4)?,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?;

        Ok(columns.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Handles keyed by resolved absolute path.
#[derive(Default)]
pub struct StoreRegistry {
    stores: Mutex<HashMap<PathBuf, Arc<SqliteStore>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached handle for `path`, opening it on first use.
    pub fn get_or_open(&self, path: &Path) -> ToolResult<Arc<SqliteStore>> {
        let mut stores = self.stores.lock().map_err(|e| {
            ToolError::internal(format!("Failed to acquire store registry lock: {}", e))
        })?;

        if let Some(store) = stores.get(path) {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(SqliteStore::open(path)?);
        stores.insert(path.to_path_buf(), Arc::clone(&store));
        Ok(store)
    }

    /// Number of cached handles.
    pub fn len(&self) -> usize {
        self.stores.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
