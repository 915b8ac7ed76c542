//! SQLite target driver.
//!
//! - [`SqliteWriter`]: file lifecycle, DDL execution and row inserts
//! - [`TableCopy`]: one table's insert transaction
//!
//! Statements run over one connection in the order they are issued. When a
//! target password is configured it is applied with `PRAGMA key` right after
//! opening; builds linked against a plain SQLite ignore the pragma.

mod writer;

pub use writer::{SqliteWriter, TableCopy};
