//! MySQL/MariaDB source reader implementation.
//!
//! Implements the `SourceReader` trait over a single sqlx connection. Catalog
//! metadata comes from `INFORMATION_SCHEMA`, filtered to the configured
//! database; row data is streamed with a forward-only cursor.

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Connection, Row, ValueRef};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::identifier::quote_mysql;
use crate::core::schema::{
    ColumnDescriptor, IndexRow, KeyRole, PrimaryKeyDescriptor, TableDescriptor,
};
use crate::core::traits::{RowStream, SourceReader};
use crate::core::value::{Row as ValueRow, SqlValue};
use crate::error::{MigrateError, Result};
use crate::typemap::SourceType;

/// MySQL/MariaDB source reader implementation.
pub struct MysqlReader {
    conn: MySqlConnection,
    database: String,
    /// Server reports `COLUMN_DEFAULT` as SQL literals (MariaDB 10.2.7+).
    quoted_defaults: bool,
}

impl MysqlReader {
    /// Open the source connection described by `config`.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let mut conn = MySqlConnection::connect_with(&config.connect_options())
            .await
            .map_err(|e| MigrateError::pool(e, "connecting to MySQL source"))?;

        // Test connection
        let version: String = sqlx::query_scalar("SELECT CAST(VERSION() AS CHAR)")
            .fetch_one(&mut conn)
            .await
            .map_err(|e| MigrateError::pool(e, "testing MySQL source connection"))?;

        info!(
            "Connected to MySQL source: {}:{}/{} (server {})",
            config.host, config.port, config.database, version
        );

        Ok(Self {
            conn,
            database: config.database.clone(),
            quoted_defaults: quotes_column_defaults(&version),
        })
    }

    /// Close the connection, reporting any error from the server goodbye.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| MigrateError::pool(e, "closing MySQL source connection"))
    }
}

#[async_trait]
impl SourceReader for MysqlReader {
    async fn list_tables(&mut self) -> Result<Vec<TableDescriptor>> {
        // CAST to CHAR to handle collation differences where information_schema
        // may return VARBINARY instead of VARCHAR
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| MigrateError::pool(e, "listing MySQL tables"))?;

        let tables = rows
            .iter()
            .map(|row| row.try_get::<String, _>("TABLE_NAME").map(TableDescriptor::new))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| catalog_error("tables", &self.database, e))?;

        info!(
            "Found {} tables in MySQL database '{}'",
            tables.len(),
            self.database
        );
        Ok(tables)
    }

    async fn list_columns(&mut self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>> {
        let query = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(COLUMN_TYPE AS CHAR) AS COLUMN_TYPE,
                CAST(IS_NULLABLE AS CHAR(3)) AS IS_NULLABLE,
                CAST(COLUMN_KEY AS CHAR(3)) AS COLUMN_KEY,
                CAST(EXTRA AS CHAR(255)) AS EXTRA,
                CAST(COLUMN_DEFAULT AS CHAR) AS COLUMN_DEFAULT
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(&table.name)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| MigrateError::pool(e, "loading MySQL columns"))?;

        let columns = rows
            .iter()
            .map(|row| column_from_row(row, self.quoted_defaults))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| catalog_error("columns", &table.name, e))?;

        debug!("Loaded {} columns for {}", columns.len(), table.name);
        Ok(columns)
    }

    async fn list_indexes(&mut self, table: &TableDescriptor) -> Result<Vec<IndexRow>> {
        // Expression index parts have no column name and are skipped.
        let query = r#"
            SELECT
                CAST(INDEX_NAME AS CHAR(255)) AS INDEX_NAME,
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(SEQ_IN_INDEX AS SIGNED) AS SEQ_IN_INDEX,
                CAST(NON_UNIQUE AS SIGNED) AS NON_UNIQUE
            FROM INFORMATION_SCHEMA.STATISTICS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
              AND COLUMN_NAME IS NOT NULL
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(&table.name)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| MigrateError::pool(e, "loading MySQL indexes"))?;

        let indexes = rows
            .iter()
            .map(index_row_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| catalog_error("indexes", &table.name, e))?;

        debug!("Loaded {} index rows for {}", indexes.len(), table.name);
        Ok(indexes)
    }

    async fn list_primary_key(&mut self, table: &TableDescriptor) -> Result<PrimaryKeyDescriptor> {
        let query = r#"
            SELECT CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
            FROM INFORMATION_SCHEMA.STATISTICS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND INDEX_NAME = 'PRIMARY'
            ORDER BY SEQ_IN_INDEX
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(&table.name)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| MigrateError::pool(e, "loading MySQL primary key"))?;

        let columns = rows
            .iter()
            .map(|row| row.try_get::<String, _>("COLUMN_NAME"))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| catalog_error("primary key", &table.name, e))?;

        Ok(PrimaryKeyDescriptor::new(columns))
    }

    fn stream_rows<'a>(
        &'a mut self,
        table: &'a TableDescriptor,
        columns: &'a [ColumnDescriptor],
    ) -> RowStream<'a> {
        let sql = match select_rows_sql(table, columns) {
            Ok(sql) => sql,
            Err(e) => return futures::stream::once(async move { Err(e) }).boxed(),
        };
        let types: Vec<SourceType> = columns
            .iter()
            .map(|c| SourceType::parse(&c.raw_type))
            .collect();
        let conn = &mut self.conn;

        stream! {
            let mut rows = sqlx::query(&sql).fetch(conn);
            let mut row_num: u64 = 0;

            while let Some(next) = rows.next().await {
                row_num += 1;
                match next {
                    Ok(row) => {
                        yield decode_row(&row, &types).map_err(|message| MigrateError::RowDecode {
                            table: table.name.clone(),
                            row: row_num,
                            message,
                        });
                    }
                    Err(e) => {
                        // The cursor is unusable after a fetch error.
                        yield Err(MigrateError::Source(e));
                        break;
                    }
                }
            }
        }
        .boxed()
    }

    async fn row_count(&mut self, table: &TableDescriptor) -> Result<i64> {
        let query = format!("SELECT COUNT(*) AS cnt FROM {}", quote_mysql(&table.name)?);

        let row: MySqlRow = sqlx::query(&query)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| MigrateError::pool(e, "getting MySQL row count"))?;

        row.try_get::<i64, _>("cnt")
            .map_err(|e| catalog_error("row count", &table.name, e))
    }
}

fn catalog_error(what: &str, object: &str, e: sqlx::Error) -> MigrateError {
    MigrateError::SchemaExtraction(format!("reading {} of {}: {}", what, object, e))
}

fn column_from_row(
    row: &MySqlRow,
    quoted_defaults: bool,
) -> std::result::Result<ColumnDescriptor, sqlx::Error> {
    let nullable: String = row.try_get("IS_NULLABLE")?;
    let key: Option<String> = row.try_get("COLUMN_KEY")?;
    let extra: Option<String> = row.try_get("EXTRA")?;
    let default: Option<String> = row.try_get("COLUMN_DEFAULT")?;

    Ok(ColumnDescriptor {
        name: row.try_get("COLUMN_NAME")?,
        raw_type: row.try_get("COLUMN_TYPE")?,
        is_nullable: nullable.eq_ignore_ascii_case("YES"),
        key: KeyRole::from_catalog(key.as_deref().unwrap_or_default()),
        extra: extra.unwrap_or_default(),
        default: if quoted_defaults {
            unquote_default(default)
        } else {
            default
        },
    })
}

/// Whether the server reports column defaults as SQL literals.
///
/// MariaDB 10.2.7 and later return `'text'` for string defaults and `NULL`
/// for a column without one; MySQL returns the bare value and SQL NULL.
fn quotes_column_defaults(version: &str) -> bool {
    if !version.contains("MariaDB") {
        return false;
    }
    // Older servers prefix the version with `5.5.5-` for replication clients.
    let version = version.strip_prefix("5.5.5-").unwrap_or(version);
    let parts: Vec<u32> = version
        .split(|c: char| !c.is_ascii_digit())
        .take(3)
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    match parts.as_slice() {
        [major, minor, patch] => (*major, *minor, *patch) >= (10, 2, 7),
        _ => true,
    }
}

/// Turn a MariaDB default literal back into the bare value.
///
/// Expressions such as `current_timestamp()` and numeric literals pass
/// through unchanged.
fn unquote_default(default: Option<String>) -> Option<String> {
    let literal = default?;
    if literal == "NULL" {
        return None;
    }
    match literal
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(inner) => Some(inner.replace("''", "'")),
        None => Some(literal),
    }
}

fn index_row_from_row(row: &MySqlRow) -> std::result::Result<IndexRow, sqlx::Error> {
    let seq: i64 = row.try_get("SEQ_IN_INDEX")?;
    let non_unique: i64 = row.try_get("NON_UNIQUE")?;

    Ok(IndexRow {
        index_name: row.try_get("INDEX_NAME")?,
        column_name: row.try_get("COLUMN_NAME")?,
        seq_in_index: u32::try_from(seq).unwrap_or(u32::MAX),
        non_unique: non_unique != 0,
    })
}

/// Build the `SELECT` that streams a table, listing columns in catalog order.
///
/// `TIME` columns are read as text: their range (-838:59:59 to 838:59:59)
/// does not fit a time of day.
fn select_rows_sql(table: &TableDescriptor, columns: &[ColumnDescriptor]) -> Result<String> {
    let col_list = columns
        .iter()
        .map(|c| {
            let name = quote_mysql(&c.name)?;
            if SourceType::parse(&c.raw_type).base == "time" {
                Ok(format!("CAST({} AS CHAR) AS {}", name, name))
            } else {
                Ok(name)
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "SELECT {} FROM {}",
        col_list.join(", "),
        quote_mysql(&table.name)?
    ))
}

/// Convert a MySQL row to a value vector in column order.
fn decode_row(row: &MySqlRow, types: &[SourceType]) -> std::result::Result<ValueRow, String> {
    types
        .iter()
        .enumerate()
        .map(|(idx, ty)| {
            decode_value(row, idx, ty).map_err(|e| {
                let name = sqlx::Column::name(&row.columns()[idx]).to_string();
                format!("column {} ({}): {}", name, ty.base, e)
            })
        })
        .collect()
}

/// Decode one column, choosing the typed accessor from the declared type.
///
/// A value whose typed decode fails is retried as text, then as raw bytes,
/// before the row is reported as undecodable.
fn decode_value(
    row: &MySqlRow,
    idx: usize,
    ty: &SourceType,
) -> std::result::Result<SqlValue, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(SqlValue::Null);
    }

    let typed = match ty.base.as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => {
            if ty.unsigned {
                row.try_get::<u64, _>(idx).map(|v| match i64::try_from(v) {
                    Ok(v) => SqlValue::I64(v),
                    // Above i64::MAX: keep the exact digits.
                    Err(_) => SqlValue::Text(v.to_string()),
                })
            } else {
                row.try_get::<i64, _>(idx).map(SqlValue::I64)
            }
        }

        "float" => row
            .try_get::<f32, _>(idx)
            .map(|v| SqlValue::F64(f64::from(v))),
        "double" | "real" => row.try_get::<f64, _>(idx).map(SqlValue::F64),

        "decimal" | "numeric" => row
            .try_get::<rust_decimal::Decimal, _>(idx)
            .map(|d| SqlValue::Text(d.to_string())),

        "bit" | "bool" | "boolean" => row
            .try_get::<bool, _>(idx)
            .map(SqlValue::Bool)
            .or_else(|_| row.try_get::<u64, _>(idx).map(|v| SqlValue::I64(v as i64))),

        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set"
        | "json" => row.try_get::<String, _>(idx).map(SqlValue::Text),

        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            row.try_get::<Vec<u8>, _>(idx).map(SqlValue::Bytes)
        }

        "date" => row.try_get::<chrono::NaiveDate, _>(idx).map(SqlValue::Date),
        "time" => row.try_get::<String, _>(idx).map(time_value),
        "datetime" | "timestamp" => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .map(SqlValue::DateTime),
        "year" => row
            .try_get::<u16, _>(idx)
            .map(|v| SqlValue::I64(i64::from(v)))
            .or_else(|_| row.try_get::<i16, _>(idx).map(|v| SqlValue::I64(i64::from(v)))),

        _ => row.try_get::<String, _>(idx).map(SqlValue::Text),
    };

    typed.or_else(|e| {
        row.try_get::<String, _>(idx)
            .map(SqlValue::Text)
            .or_else(|_| row.try_get::<Vec<u8>, _>(idx).map(SqlValue::Bytes))
            .map_err(|_| e)
    })
}

/// A `TIME` value read as text: a time of day when it is one, else the text.
fn time_value(text: String) -> SqlValue {
    match chrono::NaiveTime::parse_from_str(&text, "%H:%M:%S%.f") {
        Ok(t) if !text.starts_with('-') => SqlValue::Time(t),
        _ => SqlValue::Text(text),
    }
}
