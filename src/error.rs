//! Error types for Rigging.
//!
//! Two layers live here. [`RiggingError`] is the library-level error used for
//! configuration loading, server plumbing and tool-call parsing. [`ToolError`]
//! is what a tool operation hands back to the dispatcher: it carries a
//! [`ToolErrorKind`] so callers can match exhaustively instead of sniffing
//! message strings.

use serde::Serialize;
use thiserror::Error;

/// Library-level error type for Rigging operations.
#[derive(Error, Debug)]
pub enum RiggingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid tool call: {0}")]
    InvalidToolCall(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Result type alias for Rigging operations.
pub type Result<T> = std::result::Result<T, RiggingError>;

/// Category of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Missing API key, unusable path, rejected credentials.
    Configuration,
    /// Bad arguments, detected before any I/O.
    Validation,
    /// The thing asked for does not exist.
    NotFound,
    /// Timeouts, connection failures, non-2xx responses.
    Transient,
    /// A provider answered but the payload lacked an expected field.
    DataShape,
    /// SQLite or file system failure.
    Storage,
    Internal,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ToolErrorKind::Configuration => "configuration",
            ToolErrorKind::Validation => "validation",
            ToolErrorKind::NotFound => "not_found",
            ToolErrorKind::Transient => "transient",
            ToolErrorKind::DataShape => "data_shape",
            ToolErrorKind::Storage => "storage",
            ToolErrorKind::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

/// A failed tool call: a kind plus a message fit for the model to read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Configuration, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Transient, message)
    }

    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::DataShape, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Storage, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, message)
    }
}

impl From<rusqlite::Error> for ToolError {
    fn from(e: rusqlite::Error) -> Self {
        ToolError::storage(format!("Database error: {}", e))
    }
}

/// Result of a single tool operation.
pub type ToolResult<T> = std::result::Result<T, ToolError>;
