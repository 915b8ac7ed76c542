//! In-memory run state: per-table progress and the failure ledger.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::error;

/// State of one migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationState {
    /// Unique run identifier.
    pub run_id: String,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// Current run status.
    pub status: RunStatus,

    /// Per-table state, in processing order.
    pub tables: IndexMap<String, TableState>,

    /// Every recoverable failure, in the order it happened.
    pub failures: Vec<Failure>,

    /// When the migration completed (if finished).
    pub completed_at: Option<DateTime<Utc>>,
}

/// Overall run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    CompletedWithErrors,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithErrors => "completed_with_errors",
        }
    }
}

/// Per-table state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableState {
    /// Task status.
    pub status: TaskStatus,

    /// Whether `CREATE TABLE` succeeded.
    pub created: bool,

    /// Rows pulled from the source cursor, decode failures included.
    pub rows_read: u64,

    /// Rows inserted into the target.
    pub rows_written: u64,

    /// Rows that failed to decode or insert.
    pub rows_failed: u64,

    /// Wall time spent copying the table.
    pub duration_ms: u64,
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// What kind of object a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CreateTable,
    CreateIndex,
    Row,
    Validation,
}

/// One recoverable failure: the object it concerns and the error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub object: String,
    pub error: String,
}

impl MigrationState {
    /// Create a new migration state.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            status: RunStatus::Running,
            tables: IndexMap::new(),
            failures: Vec::new(),
            completed_at: None,
        }
    }

    /// Get or create table state.
    pub fn table_mut(&mut self, table_name: &str) -> &mut TableState {
        self.tables.entry(table_name.to_string()).or_default()
    }

    /// Record a recoverable failure and log it at error level.
    pub fn record_failure(
        &mut self,
        kind: FailureKind,
        object: impl Into<String>,
        error: impl ToString,
    ) {
        let failure = Failure {
            kind,
            object: object.into(),
            error: error.to_string(),
        };
        error!(kind = ?failure.kind, object = %failure.object, "{}", failure.error);
        self.failures.push(failure);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Total rows inserted across all tables.
    pub fn rows_transferred(&self) -> u64 {
        self.tables.values().map(|t| t.rows_written).sum()
    }

    /// Total rows that failed across all tables.
    pub fn rows_failed(&self) -> u64 {
        self.tables.values().map(|t| t.rows_failed).sum()
    }

    /// Close the run, choosing the final status from the failure ledger.
    pub fn finish(&mut self) {
        self.status = if self.has_failures() {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Completed
        };
        self.completed_at = Some(Utc::now());
    }
}
