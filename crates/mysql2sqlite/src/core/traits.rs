//! Core traits for database-agnostic migration.
//!
//! - [`SourceReader`]: reads catalog metadata and row data from a source database

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

use super::schema::{ColumnDescriptor, IndexRow, PrimaryKeyDescriptor, TableDescriptor};
use super::value::Row;

/// Forward-only stream of decoded source rows.
///
/// An item is `Err` either because a single row failed to decode
/// ([`MigrateError::is_row_level`](crate::error::MigrateError::is_row_level)),
/// after which the stream continues, or because the cursor itself failed,
/// after which the stream ends.
pub type RowStream<'a> = BoxStream<'a, Result<Row>>;

/// Read catalog metadata and rows from a source database.
///
/// Implementations hold a single connection and are driven strictly
/// sequentially, hence `&mut self` everywhere. Every introspection error is
/// fatal to the run and must be returned, never swallowed.
#[async_trait]
pub trait SourceReader: Send {
    /// List base tables in a deterministic order.
    async fn list_tables(&mut self) -> Result<Vec<TableDescriptor>>;

    /// List the columns of a table in definition order.
    ///
    /// This order is authoritative for both DDL and insert column order.
    async fn list_columns(&mut self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>>;

    /// List raw index rows, ordered by sequence within each index.
    async fn list_indexes(&mut self, table: &TableDescriptor) -> Result<Vec<IndexRow>>;

    /// Primary key columns ordered by sequence in the `PRIMARY` index.
    async fn list_primary_key(&mut self, table: &TableDescriptor) -> Result<PrimaryKeyDescriptor>;

    /// Open a streaming cursor over every row of a table.
    ///
    /// Values in each row follow the order of `columns`. The full result set
    /// is never materialized.
    fn stream_rows<'a>(
        &'a mut self,
        table: &'a TableDescriptor,
        columns: &'a [ColumnDescriptor],
    ) -> RowStream<'a>;

    /// Count the rows of a table.
    async fn row_count(&mut self, table: &TableDescriptor) -> Result<i64>;
}
