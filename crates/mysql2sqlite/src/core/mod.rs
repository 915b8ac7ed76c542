//! Core abstractions for database-agnostic migration.
//!
//! - [`schema`]: table, column, primary key and index descriptors
//! - [`value`]: SQL value representation carried between drivers
//! - [`traits`]: the [`SourceReader`] trait implemented by source drivers
//! - [`identifier`]: identifier validation and quoting
//!
//! Driver modules (`drivers/mysql`, `drivers/sqlite`) implement or consume
//! these types; nothing here performs I/O.

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{
    ColumnDescriptor, IndexGroupDescriptor, IndexRow, KeyRole, PrimaryKeyDescriptor,
    TableDescriptor, PRIMARY_INDEX_NAME,
};
pub use traits::{RowStream, SourceReader};
pub use value::{Row, SqlValue};
