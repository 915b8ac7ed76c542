//! # mysql2sqlite
//!
//! MySQL to SQLite schema and data migration library.
//!
//! A run reads the source catalog, creates the matching tables and indexes in
//! a fresh SQLite file, then streams every table's rows across:
//!
//! - **Schema translation** through a small typed DDL model
//! - **Streaming copy** with one transaction per table
//! - **Per-row failure isolation**: bad rows are logged and skipped
//! - **Row count validation** after the copy
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql2sqlite::{Config, Orchestrator};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> mysql2sqlite::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run().await?;
//!     println!("Migrated {} rows", result.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod ddl;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod state;
pub mod transfer;
pub mod typemap;

// Re-exports for convenient access
pub use builder::SchemaBuilder;
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use crate::core::{
    ColumnDescriptor, IndexGroupDescriptor, IndexRow, KeyRole, PrimaryKeyDescriptor, Row,
    RowStream, SourceReader, SqlValue, TableDescriptor,
};
pub use drivers::{MysqlReader, SqliteWriter, TableCopy};
pub use error::{MigrateError, Result};
pub use orchestrator::{migrate, validate_row_counts, MigrationResult, Orchestrator, RowCountCheck};
pub use state::{Failure, FailureKind, MigrationState, RunStatus, TableState};
pub use transfer::{RowBuffer, TransferEngine, TransferStats};
