//! SQLite target writer implementation.

use std::io::Write;
use std::path::Path;

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row, Transaction};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::identifier::sqlite_ident;
use crate::core::value::SqlValue;
use crate::ddl::InsertTemplate;
use crate::error::{MigrateError, Result};

/// Where echoed statements are written.
type QuerySink = Box<dyn Write + Send>;

/// SQLite target writer.
///
/// Owns the only connection to the target file for the whole run.
pub struct SqliteWriter {
    conn: SqliteConnection,
    echo: Option<QuerySink>,
}

impl SqliteWriter {
    /// Create a fresh target database.
    ///
    /// An existing file at the target path is removed first, so every run
    /// starts from an empty database. A password is refused before anything
    /// is removed when the linked SQLite cannot encrypt.
    pub async fn open(config: &TargetConfig) -> Result<Self> {
        if !config.password.is_empty() {
            ensure_encryption_available().await?;
        }

        remove_existing(&config.file).await?;

        let mut conn = SqliteConnection::connect_with(&config.connect_options())
            .await
            .map_err(|e| MigrateError::pool(e, "opening SQLite target"))?;

        // Fails here rather than on the first DDL statement when the key is wrong.
        sqlx::query("SELECT count(*) FROM sqlite_master")
            .execute(&mut conn)
            .await
            .map_err(|e| MigrateError::pool(e, "testing SQLite target connection"))?;

        info!("Opened SQLite target: {}", config.file.display());

        Ok(Self { conn, echo: None })
    }

    /// Turn the echo of every statement to standard output on or off.
    pub fn set_query_log(&mut self, enabled: bool) {
        self.echo = if enabled {
            Some(Box::new(std::io::stdout()))
        } else {
            None
        };
    }

    /// Echo every statement to `sink` instead of standard output.
    pub fn set_query_sink(&mut self, sink: impl Write + Send + 'static) {
        self.echo = Some(Box::new(sink));
    }

    /// Whether statements are being echoed.
    pub fn echoes_queries(&self) -> bool {
        self.echo.is_some()
    }

    /// Execute one statement that takes no parameters.
    pub async fn execute(&mut self, sql: &str) -> Result<u64> {
        echo(&mut self.echo, sql);
        let result = sqlx::query(sql)
            .execute(&mut self.conn)
            .await
            .map_err(MigrateError::Target)?;
        Ok(result.rows_affected())
    }

    /// Start the insert transaction for one table.
    pub async fn begin(&mut self) -> Result<TableCopy<'_>> {
        let tx = self.conn.begin().await.map_err(MigrateError::Target)?;
        Ok(TableCopy {
            tx,
            echo: &mut self.echo,
            inserted: 0,
        })
    }

    /// Count the rows of a target table.
    pub async fn row_count(&mut self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", sqlite_ident(table));
        let row: SqliteRow = sqlx::query(&sql)
            .fetch_one(&mut self.conn)
            .await
            .map_err(MigrateError::Target)?;
        row.try_get::<i64, _>(0).map_err(MigrateError::Target)
    }

    /// Names of user tables, sorted.
    pub async fn table_names(&mut self) -> Result<Vec<String>> {
        self.names_of("table", None).await
    }

    /// Names of explicitly created indexes on a table, sorted.
    pub async fn index_names(&mut self, table: &str) -> Result<Vec<String>> {
        self.names_of("index", Some(table)).await
    }

    async fn names_of(&mut self, kind: &str, table: Option<&str>) -> Result<Vec<String>> {
        // Implicit indexes (sqlite_autoindex_*) have no SQL text.
        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT name FROM sqlite_master \
             WHERE type = ?1 AND name NOT LIKE 'sqlite_%' AND sql IS NOT NULL \
             AND (?2 IS NULL OR tbl_name = ?2) \
             ORDER BY name",
        )
        .bind(kind)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await
        .map_err(MigrateError::Target)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(MigrateError::Target)
    }

    /// Close the connection, flushing the database file.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| MigrateError::pool(e, "closing SQLite target"))
    }
}

async fn remove_existing(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed existing target file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MigrateError::Io(e)),
    }
}

/// Refuse a target password unless the linked SQLite is SQLCipher.
///
/// Plain SQLite ignores `PRAGMA key` and would write the file unencrypted.
async fn ensure_encryption_available() -> Result<()> {
    let options: SqliteConnectOptions = "sqlite::memory:"
        .parse()
        .map_err(|e| MigrateError::pool(e, "checking SQLite encryption support"))?;
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .map_err(|e| MigrateError::pool(e, "checking SQLite encryption support"))?;

    // Unknown pragmas return no rows.
    let cipher: Option<String> = sqlx::query_scalar("PRAGMA cipher_version")
        .fetch_optional(&mut conn)
        .await
        .map_err(MigrateError::Target)?;
    conn.close().await.map_err(MigrateError::Target)?;

    match cipher {
        Some(version) if !version.is_empty() => {
            debug!("SQLCipher {} available for target encryption", version);
            Ok(())
        }
        _ => Err(MigrateError::Config(
            "--sqlitePassword needs SQLite built with SQLCipher; this build cannot encrypt the target"
                .to_string(),
        )),
    }
}

fn echo(sink: &mut Option<QuerySink>, sql: &str) {
    if let Some(out) = sink {
        if let Err(e) = writeln!(out, "{}", sql) {
            warn!("Could not echo statement: {}", e);
        }
    }
}

/// Insert transaction for a single table.
///
/// A failed insert only aborts its own statement; the transaction stays open
/// and rows inserted before and after it are kept on [`TableCopy::commit`].
/// Dropping the value without committing rolls everything back.
pub struct TableCopy<'c> {
    tx: Transaction<'c, Sqlite>,
    echo: &'c mut Option<QuerySink>,
    inserted: u64,
}

impl<'c> TableCopy<'c> {
    /// Insert one row through the table's prepared template.
    pub async fn insert(&mut self, template: &InsertTemplate, values: &[SqlValue]) -> Result<()> {
        if values.len() != template.arity() {
            return Err(MigrateError::transfer(
                &template.table,
                format!(
                    "row has {} values, insert expects {}",
                    values.len(),
                    template.arity()
                ),
            ));
        }

        echo(&mut *self.echo, template.sql());
        let query = values
            .iter()
            .fold(sqlx::query(template.sql()), |query, value| bind_value(query, value));

        query
            .execute(&mut *self.tx)
            .await
            .map_err(MigrateError::Target)?;
        self.inserted += 1;
        Ok(())
    }

    /// Commit every successful insert. Returns how many rows were inserted.
    pub async fn commit(self) -> Result<u64> {
        self.tx.commit().await.map_err(MigrateError::Target)?;
        Ok(self.inserted)
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::I64(v) => query.bind(*v),
        SqlValue::F64(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Bytes(v) => query.bind(v.as_slice()),
        SqlValue::Date(v) => query.bind(*v),
        SqlValue::Time(v) => query.bind(*v),
        SqlValue::DateTime(v) => query.bind(*v),
    }
}
