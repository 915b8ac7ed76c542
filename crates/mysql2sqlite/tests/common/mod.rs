//! In-memory source catalog and SQLite target helpers shared by the
//! integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use mysql2sqlite::{
    ColumnDescriptor, IndexRow, KeyRole, MigrateError, PrimaryKeyDescriptor, Result, Row,
    RowStream, SourceReader, SqlValue, SqliteWriter, TableDescriptor, TargetConfig,
};

/// A row as the fake cursor will yield it.
#[derive(Debug, Clone)]
pub enum FakeRow {
    Values(Row),
    /// Yields a row-level decode error.
    Undecodable(String),
    /// Yields a fatal cursor error and ends the stream.
    CursorLost,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexRow>,
    pub rows: Vec<FakeRow>,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn column(mut self, name: &str, raw_type: &str, nullable: bool) -> Self {
        self.columns.push(ColumnDescriptor {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            is_nullable: nullable,
            key: KeyRole::None,
            extra: String::new(),
            default: None,
        });
        self
    }

    pub fn auto_increment_key(mut self, name: &str, raw_type: &str) -> Self {
        self.columns.push(ColumnDescriptor {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            is_nullable: false,
            key: KeyRole::Primary,
            extra: "auto_increment".to_string(),
            default: None,
        });
        self.primary_key.push(name.to_string());
        self
    }

    pub fn default_value(mut self, default: &str) -> Self {
        if let Some(last) = self.columns.last_mut() {
            last.default = Some(default.to_string());
        }
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn index(mut self, name: &str, columns: &[&str], unique: bool) -> Self {
        for (i, col) in columns.iter().enumerate() {
            self.indexes.push(IndexRow {
                index_name: name.to_string(),
                column_name: col.to_string(),
                seq_in_index: i as u32 + 1,
                non_unique: !unique,
            });
        }
        self
    }

    pub fn row(mut self, values: Vec<SqlValue>) -> Self {
        self.rows.push(FakeRow::Values(values));
        self
    }

    pub fn raw_row(mut self, row: FakeRow) -> Self {
        self.rows.push(row);
        self
    }
}

/// Source reader backed by a fixed list of tables.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    pub tables: Vec<FakeTable>,
    /// Makes every `list_indexes` call fail.
    pub fail_index_listing: bool,
}

impl FakeSource {
    pub fn new(tables: Vec<FakeTable>) -> Self {
        Self {
            tables,
            fail_index_listing: false,
        }
    }

    fn table(&self, table: &TableDescriptor) -> Result<&FakeTable> {
        self.tables
            .iter()
            .find(|t| t.name == table.name)
            .ok_or_else(|| MigrateError::SchemaExtraction(format!("no table {}", table.name)))
    }
}

#[async_trait]
impl SourceReader for FakeSource {
    async fn list_tables(&mut self) -> Result<Vec<TableDescriptor>> {
        let mut names: Vec<&str> = self.tables.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        Ok(names.into_iter().map(TableDescriptor::new).collect())
    }

    async fn list_columns(&mut self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn list_indexes(&mut self, table: &TableDescriptor) -> Result<Vec<IndexRow>> {
        if self.fail_index_listing {
            return Err(MigrateError::SchemaExtraction(
                "index catalog unavailable".to_string(),
            ));
        }
        Ok(self.table(table)?.indexes.clone())
    }

    async fn list_primary_key(&mut self, table: &TableDescriptor) -> Result<PrimaryKeyDescriptor> {
        Ok(PrimaryKeyDescriptor::new(self.table(table)?.primary_key.clone()))
    }

    fn stream_rows<'a>(
        &'a mut self,
        table: &'a TableDescriptor,
        _columns: &'a [ColumnDescriptor],
    ) -> RowStream<'a> {
        let rows = match self.table(table) {
            Ok(t) => t.rows.clone(),
            Err(e) => return futures::stream::once(async move { Err(e) }).boxed(),
        };

        let mut items: Vec<Result<Row>> = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            match row {
                FakeRow::Values(values) => items.push(Ok(values)),
                FakeRow::Undecodable(message) => items.push(Err(MigrateError::RowDecode {
                    table: table.name.clone(),
                    row: i as u64 + 1,
                    message,
                })),
                FakeRow::CursorLost => {
                    items.push(Err(MigrateError::transfer(&table.name, "connection lost")));
                    break;
                }
            }
        }
        futures::stream::iter(items).boxed()
    }

    async fn row_count(&mut self, table: &TableDescriptor) -> Result<i64> {
        Ok(self.table(table)?.rows.len() as i64)
    }
}

/// Statement echo captured in memory.
#[derive(Debug, Clone, Default)]
pub struct EchoBuffer(Arc<Mutex<Vec<u8>>>);

impl EchoBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for EchoBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Target config pointing at `<dir>/target.db`.
pub fn target_config(dir: &tempfile::TempDir) -> TargetConfig {
    TargetConfig {
        file: dir.path().join("target.db"),
        password: String::new(),
    }
}

pub async fn open_target(dir: &tempfile::TempDir) -> SqliteWriter {
    SqliteWriter::open(&target_config(dir)).await.unwrap()
}

/// Read back the `CREATE` statement SQLite stored for an object.
pub async fn stored_sql(path: &std::path::Path, name: &str) -> Option<String> {
    let options = sqlx::sqlite::SqliteConnectOptions::new().filename(path);
    let mut conn = <sqlx::SqliteConnection as sqlx::Connection>::connect_with(&options)
        .await
        .unwrap();
    let sql: Option<(String,)> = sqlx::query_as("SELECT sql FROM sqlite_master WHERE name = ?1")
        .bind(name)
        .fetch_optional(&mut conn)
        .await
        .unwrap();
    sql.map(|(s,)| s)
}

/// Column names of a target table, in definition order.
pub async fn column_names(path: &std::path::Path, table: &str) -> Vec<String> {
    let options = sqlx::sqlite::SqliteConnectOptions::new().filename(path);
    let mut conn = <sqlx::SqliteConnection as sqlx::Connection>::connect_with(&options)
        .await
        .unwrap();
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .bind(table)
        .fetch_all(&mut conn)
        .await
        .unwrap();
    rows.into_iter().map(|(n,)| n).collect()
}
