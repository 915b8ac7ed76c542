//! Error types for the migration library.

use thiserror::Error;

/// Exit code for configuration and CLI errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for source (MySQL) failures.
pub const EXIT_SOURCE_ERROR: u8 = 2;
/// Exit code for target (SQLite) failures.
pub const EXIT_TARGET_ERROR: u8 = 3;
/// Exit code for transfer failures.
pub const EXIT_TRANSFER_ERROR: u8 = 4;
/// Exit code for filesystem errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database query error
    #[error("Source database error: {0}")]
    Source(#[source] sqlx::Error),

    /// Target database statement error
    #[error("Target database error: {0}")]
    Target(#[source] sqlx::Error),

    /// Connection error with context
    #[error("Connection error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Catalog introspection failed
    #[error("Schema extraction failed: {0}")]
    SchemaExtraction(String),

    /// Data transfer failed for a specific table
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// A single source row could not be decoded
    #[error("Row {row} of table {table} could not be decoded: {message}")]
    RowDecode {
        table: String,
        row: u64,
        message: String,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Transfer error
    pub fn transfer(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Transfer {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Whether the error only affects one row and the copy may continue.
    pub fn is_row_level(&self) -> bool {
        matches!(self, MigrateError::RowDecode { .. })
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Source(_) | MigrateError::SchemaExtraction(_) => EXIT_SOURCE_ERROR,
            MigrateError::Target(_) => EXIT_TARGET_ERROR,
            MigrateError::Pool { context, .. } => {
                if context.contains("SQLite") {
                    EXIT_TARGET_ERROR
                } else {
                    EXIT_SOURCE_ERROR
                }
            }
            MigrateError::Transfer { .. }
            | MigrateError::RowDecode { .. }
            | MigrateError::Json(_) => EXIT_TRANSFER_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
