//! Identifier validation and quoting for generated SQL.
//!
//! Table, column and index names come from the source catalog and are
//! spliced into DDL and DML text, since identifiers cannot be bound as
//! parameters. Every name goes through this module on the way out:
//!
//! - MySQL identifiers are always wrapped in backticks.
//! - SQLite identifiers are emitted bare when they are plain words that are
//!   not keywords, and double-quoted otherwise.

use crate::error::{MigrateError, Result};

/// Longest name accepted. MySQL caps identifiers at 64 characters; derived
/// index names join a table name and an index name.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// SQLite keywords. A bare identifier matching one of these must be quoted.
const SQLITE_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHOUT",
];

/// Check a catalog name before it is spliced into SQL text.
pub fn check_identifier(name: &str) -> Result<()> {
    let problem = if name.is_empty() {
        "is empty".to_string()
    } else if name.contains('\0') {
        "contains a NUL byte".to_string()
    } else if name.len() > MAX_IDENTIFIER_LENGTH {
        format!("is longer than {} bytes", MAX_IDENTIFIER_LENGTH)
    } else {
        return Ok(());
    };
    Err(MigrateError::SchemaExtraction(format!(
        "identifier {:?} {}",
        name, problem
    )))
}

/// Wrap a MySQL name in backticks, doubling any backtick inside it.
pub fn quote_mysql(name: &str) -> Result<String> {
    check_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Render a SQLite identifier, quoting only when required.
///
/// `users` stays `users`; `order`, `first name` and `a"b` become `"order"`,
/// `"first name"` and `"a""b"`.
pub fn sqlite_ident(name: &str) -> String {
    if is_plain_identifier(name) && !is_sqlite_keyword(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_sqlite_keyword(name: &str) -> bool {
    SQLITE_KEYWORDS
        .iter()
        .any(|kw| kw.eq_ignore_ascii_case(name))
}
