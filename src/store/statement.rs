//! Leading-keyword classification of SQL statements.
//!
//! This is not a parser. Only the first word (two or three for
//! CREATE) is inspected, so a statement that starts with a comment or a
//! `WITH ... SELECT` common table expression is not recognised as a read.

/// What kind of statement a SQL string starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Empty,
    Select,
    Insert,
    Update,
    Delete,
    Replace,
    /// `CREATE [TEMP|TEMPORARY] TABLE`
    CreateTable,
    /// `CREATE` anything else (index, view, trigger, virtual table).
    Create,
    Drop,
    Alter,
    Pragma,
    With,
    Other,
}

/// Statements `create_table` accepts.
pub const CREATE_TABLE_ALLOWED: &[StatementKind] = &[StatementKind::CreateTable];

/// Statements `read` accepts.
pub const READ_ALLOWED: &[StatementKind] = &[StatementKind::Select];

/// Statements `write` accepts: anything that does not start with SELECT.
pub const WRITE_ALLOWED: &[StatementKind] = &[
    StatementKind::Insert,
    StatementKind::Update,
    StatementKind::Delete,
    StatementKind::Replace,
    StatementKind::CreateTable,
    StatementKind::Create,
    StatementKind::Drop,
    StatementKind::Alter,
    StatementKind::Pragma,
    StatementKind::With,
    StatementKind::Other,
];

impl StatementKind {
    /// Classify a statement by its leading keyword(s), ignoring case and
    /// surrounding whitespace.
    pub fn classify(sql: &str) -> Self {
        let mut words = sql
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .map(|w| w.to_ascii_uppercase());

        let Some(first) = words.next() else {
            return StatementKind::Empty;
        };

        match first.as_str() {
            "SELECT" => StatementKind::Select,
            "INSERT" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            "REPLACE" => StatementKind::Replace,
            "DROP" => StatementKind::Drop,
            "ALTER" => StatementKind::Alter,
            "PRAGMA" => StatementKind::Pragma,
            "WITH" => StatementKind::With,
            "CREATE" => {
                let second = words.next();
                let object = match second.as_deref() {
                    Some("TEMP") | Some("TEMPORARY") => words.next(),
                    _ => second,
                };
                if object.as_deref() == Some("TABLE") {
                    StatementKind::CreateTable
                } else {
                    StatementKind::Create
                }
            }
            _ => StatementKind::Other,
        }
    }

    pub fn is_allowed(self, allowed: &[StatementKind]) -> bool {
        allowed.contains(&self)
    }
}
