//! Database driver implementations.
//!
//! - [`mysql`]: MySQL/MariaDB source, implements [`SourceReader`](crate::core::SourceReader)
//! - [`sqlite`]: SQLite target writer
//!
//! Each driver owns exactly one connection. Drivers convert between their
//! engine's wire types and [`SqlValue`](crate::core::SqlValue); everything
//! above this layer is engine-neutral apart from the SQLite DDL text.

pub mod mysql;
pub mod sqlite;

pub use mysql::MysqlReader;
pub use sqlite::{SqliteWriter, TableCopy};
