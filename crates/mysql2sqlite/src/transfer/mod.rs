//! Data transfer engine.
//!
//! Tables are copied one after another. Each table gets one insert template,
//! one target transaction and one forward-only source cursor; rows flow
//! through a single reused [`RowBuffer`]. A row that fails to decode or insert
//! is recorded and skipped, and the transaction commits once every row has
//! been attempted.

use std::time::{Duration, Instant};

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::core::schema::TableDescriptor;
use crate::core::traits::SourceReader;
use crate::core::value::{Row, SqlValue};
use crate::ddl::InsertTemplate;
use crate::drivers::sqlite::SqliteWriter;
use crate::error::Result;
use crate::state::{FailureKind, MigrationState, TaskStatus};

/// Statistics from copying one table.
#[derive(Debug, Clone, Default)]
pub struct TransferStats {
    /// Rows pulled from the source, failed decodes included.
    pub rows_read: u64,

    /// Rows inserted into the target.
    pub rows_written: u64,

    /// Rows skipped after a decode or insert failure.
    pub rows_failed: u64,

    /// Time from template build to commit.
    pub duration: Duration,
}

impl TransferStats {
    /// Average throughput over the copy.
    pub fn rows_per_second(&self) -> u64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            (self.rows_written as f64 / secs) as u64
        } else {
            self.rows_written
        }
    }
}

/// Values of the row currently being copied.
///
/// One buffer lives for a whole table and is refilled in place, so its
/// allocation is reused across rows.
#[derive(Debug, Default)]
pub struct RowBuffer {
    values: Vec<SqlValue>,
}

impl RowBuffer {
    pub fn with_capacity(columns: usize) -> Self {
        Self {
            values: Vec::with_capacity(columns),
        }
    }

    /// Replace the buffer contents with `row`.
    pub fn fill(&mut self, row: Row) {
        self.values.clear();
        self.values.extend(row);
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Copies rows from a source reader into the SQLite target.
pub struct TransferEngine<'a, S: SourceReader + ?Sized> {
    source: &'a mut S,
    target: &'a mut SqliteWriter,
}

impl<'a, S: SourceReader + ?Sized> TransferEngine<'a, S> {
    pub fn new(source: &'a mut S, target: &'a mut SqliteWriter) -> Self {
        Self { source, target }
    }

    /// Copy every table in order.
    ///
    /// Tables whose `CREATE TABLE` failed earlier in the run are skipped with a
    /// single recorded failure instead of one per row.
    pub async fn copy_all(
        &mut self,
        tables: &[TableDescriptor],
        state: &mut MigrationState,
    ) -> Result<()> {
        for table in tables {
            let not_created = state.tables.get(&table.name).is_some_and(|t| !t.created);
            if not_created {
                warn!("Skipping data for {}: table was not created", table.name);
                state.record_failure(
                    FailureKind::Row,
                    &table.name,
                    "rows not copied: table was not created",
                );
                continue;
            }
            self.copy_table(table, state).await?;
        }
        Ok(())
    }

    /// Copy all rows of one table inside a single target transaction.
    pub async fn copy_table(
        &mut self,
        table: &TableDescriptor,
        state: &mut MigrationState,
    ) -> Result<TransferStats> {
        let start = Instant::now();
        state.table_mut(&table.name).status = TaskStatus::InProgress;

        let columns = self.source.list_columns(table).await?;
        let template = InsertTemplate::new(table, &columns);

        let mut stats = TransferStats::default();
        let mut buffer = RowBuffer::with_capacity(columns.len());
        let mut copy = self.target.begin().await?;
        let mut rows = self.source.stream_rows(table, &columns);

        while let Some(item) = rows.next().await {
            stats.rows_read += 1;
            let row = match item {
                Ok(row) => row,
                Err(e) if e.is_row_level() => {
                    stats.rows_failed += 1;
                    state.record_failure(FailureKind::Row, row_object(table, stats.rows_read), e);
                    continue;
                }
                // The uncommitted transaction rolls back when `copy` drops.
                Err(e) => {
                    state.table_mut(&table.name).status = TaskStatus::Failed;
                    return Err(e);
                }
            };

            buffer.fill(row);
            match copy.insert(&template, buffer.values()).await {
                Ok(()) => stats.rows_written += 1,
                Err(e) => {
                    stats.rows_failed += 1;
                    state.record_failure(FailureKind::Row, row_object(table, stats.rows_read), e);
                }
            }
        }
        drop(rows);

        copy.commit().await?;
        stats.duration = start.elapsed();

        let entry = state.table_mut(&table.name);
        entry.status = TaskStatus::Completed;
        entry.rows_read = stats.rows_read;
        entry.rows_written = stats.rows_written;
        entry.rows_failed = stats.rows_failed;
        entry.duration_ms = stats.duration.as_millis() as u64;

        if stats.rows_failed > 0 {
            warn!(
                "{}: {} rows copied, {} rows failed",
                table.name, stats.rows_written, stats.rows_failed
            );
        } else {
            info!(
                "{}: {} rows copied ({} rows/sec)",
                table.name,
                stats.rows_written,
                stats.rows_per_second()
            );
        }
        debug!("{} copied in {:?}", table.name, stats.duration);

        Ok(stats)
    }
}

fn row_object(table: &TableDescriptor, row: u64) -> String {
    format!("{} row {}", table.name, row)
}
