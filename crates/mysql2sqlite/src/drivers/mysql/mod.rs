//! MySQL/MariaDB source driver.
//!
//! - [`MysqlReader`]: catalog introspection and row streaming
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+
//!
//! MariaDB 10.2.7 and later report column defaults as SQL literals; the
//! reader detects the server from `VERSION()` and unquotes them.
//!
//! Catalog queries read `INFORMATION_SCHEMA` restricted to the configured
//! database, so the connecting user needs `SELECT` on it and nothing more.

mod reader;

pub use reader::MysqlReader;
