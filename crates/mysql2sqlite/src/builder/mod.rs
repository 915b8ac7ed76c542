//! Target schema creation.
//!
//! Tables are created one at a time in catalog order, each followed by its
//! secondary indexes. A statement that SQLite rejects is recorded in the run
//! state and the pass moves on; a catalog query that fails ends the run.
//!
//! SQLite accepts `AUTOINCREMENT` only on a single `INTEGER PRIMARY KEY`. When
//! a table statement carrying it is rejected, it is retried once without the
//! keyword. If that also fails, the first error is recorded.

use tracing::{debug, info, warn};

use crate::core::schema::TableDescriptor;
use crate::core::traits::SourceReader;
use crate::ddl::{group_indexes, CreateIndex, CreateTable};
use crate::drivers::sqlite::SqliteWriter;
use crate::error::{MigrateError, Result};
use crate::state::{FailureKind, MigrationState, TaskStatus};

/// Emits and executes `CREATE TABLE` / `CREATE INDEX` statements.
pub struct SchemaBuilder<'a, S: SourceReader + ?Sized> {
    source: &'a mut S,
    target: &'a mut SqliteWriter,
}

impl<'a, S: SourceReader + ?Sized> SchemaBuilder<'a, S> {
    pub fn new(source: &'a mut S, target: &'a mut SqliteWriter) -> Self {
        Self { source, target }
    }

    /// Create every table, then its indexes, in the order given.
    pub async fn create_schema(
        &mut self,
        tables: &[TableDescriptor],
        state: &mut MigrationState,
    ) -> Result<()> {
        let mut created = 0usize;
        let mut indexes = 0usize;

        for table in tables {
            if self.create_table(table, state).await? {
                created += 1;
            }
            indexes += self.create_indexes(table, state).await?;
        }

        info!(
            "Created {}/{} tables and {} indexes",
            created,
            tables.len(),
            indexes
        );
        Ok(())
    }

    /// Create one table. Returns whether SQLite accepted the statement.
    pub async fn create_table(
        &mut self,
        table: &TableDescriptor,
        state: &mut MigrationState,
    ) -> Result<bool> {
        let columns = self.source.list_columns(table).await?;
        let pk = self.source.list_primary_key(table).await?;
        let stmt = CreateTable::new(table, &columns, &pk);

        let outcome = match self.target.execute(&stmt.to_string()).await {
            Err(e @ MigrateError::Target(_)) => match stmt.without_autoincrement() {
                // Blame AUTOINCREMENT only if the table is accepted without it.
                Some(plain) => match self.target.execute(&plain.to_string()).await {
                    Ok(n) => {
                        warn!(
                            "SQLite rejected AUTOINCREMENT on {} ({}), created without it",
                            table.name, e
                        );
                        Ok(n)
                    }
                    Err(_) => Err(e),
                },
                None => Err(e),
            },
            other => other,
        };

        match outcome {
            Ok(_) => {
                debug!("Created table {}", table.name);
                state.table_mut(&table.name).created = true;
                Ok(true)
            }
            Err(e) => {
                state.table_mut(&table.name).status = TaskStatus::Failed;
                state.record_failure(FailureKind::CreateTable, &table.name, e);
                Ok(false)
            }
        }
    }

    /// Create the secondary indexes of one table. Returns how many succeeded.
    pub async fn create_indexes(
        &mut self,
        table: &TableDescriptor,
        state: &mut MigrationState,
    ) -> Result<usize> {
        let rows = self.source.list_indexes(table).await?;
        let mut created = 0usize;

        for group in group_indexes(&rows) {
            let index = CreateIndex::new(&table.name, &group);
            match self.target.execute(&index.to_string()).await {
                Ok(_) => {
                    debug!("Created index {} on {}", index.name, table.name);
                    created += 1;
                }
                Err(e) => state.record_failure(FailureKind::CreateIndex, &index.name, e),
            }
        }

        Ok(created)
    }
}
