//! Migration orchestrator - main workflow coordinator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::builder::SchemaBuilder;
use crate::config::{Config, MigrationConfig};
use crate::core::schema::TableDescriptor;
use crate::core::traits::SourceReader;
use crate::drivers::mysql::MysqlReader;
use crate::drivers::sqlite::SqliteWriter;
use crate::error::Result;
use crate::state::{Failure, FailureKind, MigrationState};
use crate::transfer::TransferEngine;

/// Migration orchestrator.
///
/// Owns both connections for the duration of one run.
pub struct Orchestrator {
    config: Config,
    source: MysqlReader,
    target: SqliteWriter,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: `completed` or `completed_with_errors`.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Tables found in the source.
    pub tables_total: usize,

    /// Tables created in the target.
    pub tables_created: usize,

    /// Total rows inserted.
    pub rows_transferred: u64,

    /// Rows that failed to decode or insert.
    pub rows_failed: u64,

    /// Average throughput (rows/second).
    pub rows_per_second: u64,

    /// Row count comparison, present when validation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Vec<RowCountCheck>>,

    /// Every recoverable failure as (object, error).
    pub failures: Vec<Failure>,
}

/// Source and target row counts of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowCountCheck {
    pub table: String,
    pub source_rows: i64,
    pub target_rows: i64,
}

impl RowCountCheck {
    pub fn matches(&self) -> bool {
        self.source_rows == self.target_rows
    }
}

impl Orchestrator {
    /// Validate the configuration and open both connections.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let source = MysqlReader::connect(&config.source).await?;
        let target = SqliteWriter::open(&config.target).await?;

        Ok(Self {
            config,
            source,
            target,
        })
    }

    /// Run the migration and close both connections.
    ///
    /// Both connections are closed even when the run fails; the run's own
    /// error is reported first.
    pub async fn run(self) -> Result<MigrationResult> {
        let Self {
            config,
            mut source,
            mut target,
        } = self;

        let outcome = migrate(&config.migration, &mut source, &mut target).await;
        let source_closed = source.close().await;
        let target_closed = target.close().await;

        let result = outcome?;
        source_closed?;
        target_closed?;
        Ok(result)
    }
}

/// Run the pipeline over already-open connections.
///
/// Creates the schema, copies the data unless `schema_only` is set and
/// compares row counts when `validate` is set. `log_query` turns the
/// statement echo to standard output on; an echo already set on `target`
/// is kept. The connections are left open.
pub async fn migrate<S: SourceReader + ?Sized>(
    config: &MigrationConfig,
    source: &mut S,
    target: &mut SqliteWriter,
) -> Result<MigrationResult> {
    if config.log_query && !target.echoes_queries() {
        target.set_query_log(true);
    }

    let mut state = MigrationState::new(uuid::Uuid::new_v4().to_string());
    info!("Starting migration run: {}", state.run_id);

    let tables = source.list_tables().await?;
    info!("Found {} tables to migrate", tables.len());

    info!("Phase 1: Creating target schema");
    SchemaBuilder::new(source, target)
        .create_schema(&tables, &mut state)
        .await?;

    if config.schema_only {
        info!("Schema only: skipping data transfer");
    } else {
        info!("Phase 2: Transferring data");
        TransferEngine::new(source, target)
            .copy_all(&tables, &mut state)
            .await?;
    }

    let validation = if !config.validate {
        None
    } else if config.schema_only {
        warn!("Schema only: row count validation skipped");
        None
    } else {
        info!("Phase 3: Validating row counts");
        Some(validate_row_counts(source, target, &tables, &mut state).await?)
    };

    state.finish();
    let result = MigrationResult::from_state(state, tables.len(), validation);

    info!(
        "Migration {}: {} tables, {} rows transferred, {} failures",
        result.status,
        result.tables_total,
        result.rows_transferred,
        result.failures.len()
    );
    Ok(result)
}

/// Compare source and target row counts for every created table.
///
/// A mismatch is recorded as a failure; a count query that errors is fatal.
pub async fn validate_row_counts<S: SourceReader + ?Sized>(
    source: &mut S,
    target: &mut SqliteWriter,
    tables: &[TableDescriptor],
    state: &mut MigrationState,
) -> Result<Vec<RowCountCheck>> {
    let mut checks = Vec::with_capacity(tables.len());

    for table in tables {
        let created = state.tables.get(&table.name).is_some_and(|t| t.created);
        if !created {
            continue;
        }

        let check = RowCountCheck {
            table: table.name.clone(),
            source_rows: source.row_count(table).await?,
            target_rows: target.row_count(&table.name).await?,
        };

        if check.matches() {
            info!("{}: {} rows (match)", check.table, check.source_rows);
        } else {
            state.record_failure(
                FailureKind::Validation,
                &check.table,
                format!(
                    "row count mismatch: source={} target={}",
                    check.source_rows, check.target_rows
                ),
            );
        }
        checks.push(check);
    }

    Ok(checks)
}

impl MigrationResult {
    fn from_state(
        state: MigrationState,
        tables_total: usize,
        validation: Option<Vec<RowCountCheck>>,
    ) -> Self {
        let completed_at = state.completed_at.unwrap_or_else(Utc::now);
        let duration_seconds =
            (completed_at - state.started_at).num_milliseconds() as f64 / 1000.0;
        let rows_transferred = state.rows_transferred();
        let rows_per_second = if duration_seconds > 0.0 {
            (rows_transferred as f64 / duration_seconds) as u64
        } else {
            rows_transferred
        };

        Self {
            tables_created: state.tables.values().filter(|t| t.created).count(),
            rows_failed: state.rows_failed(),
            status: state.status.as_str().to_string(),
            run_id: state.run_id,
            duration_seconds,
            started_at: state.started_at,
            completed_at,
            tables_total,
            rows_transferred,
            rows_per_second,
            validation,
            failures: state.failures,
        }
    }

    /// Whether any recoverable failure was recorded.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_from_state() {
        let mut state = MigrationState::new("run-1");
        state.table_mut("a").created = true;
        state.table_mut("a").rows_written = 10;
        state.table_mut("b").rows_failed = 2;
        state.record_failure(FailureKind::CreateTable, "b", "syntax error");
        state.finish();

        let result = MigrationResult::from_state(state, 2, None);
        assert_eq!(result.run_id, "run-1");
        assert_eq!(result.status, "completed_with_errors");
        assert_eq!(result.tables_total, 2);
        assert_eq!(result.tables_created, 1);
        assert_eq!(result.rows_transferred, 10);
        assert_eq!(result.rows_failed, 2);
        assert!(result.has_failures());
    }

    #[test]
    fn test_result_to_json() {
        let mut state = MigrationState::new("run-2");
        state.finish();
        let result = MigrationResult::from_state(
            state,
            0,
            Some(vec![RowCountCheck {
                table: "t".to_string(),
                source_rows: 1,
                target_rows: 1,
            }]),
        );

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["failures"].as_array().unwrap().len(), 0);
        assert_eq!(json["validation"][0]["table"], "t");
    }

    #[test]
    fn test_validation_omitted_from_json_when_absent() {
        let mut state = MigrationState::new("run-3");
        state.finish();
        let result = MigrationResult::from_state(state, 0, None);
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert!(json.get("validation").is_none());
    }
}
