//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// Built once (from flags, optionally layered over a YAML file) and passed
/// by reference to the orchestrator; nothing reads settings from globals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (MySQL).
    #[serde(default)]
    pub source: SourceConfig,

    /// Target database configuration (SQLite).
    #[serde(default)]
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Server address (default: "localhost").
    #[serde(default = "default_mysql_host")]
    pub host: String,

    /// Server port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database (catalog) to migrate.
    #[serde(default)]
    pub database: String,

    /// Login user.
    #[serde(default)]
    pub user: String,

    /// Login password.
    #[serde(default)]
    pub password: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: default_mysql_host(),
            port: default_mysql_port(),
            database: String::new(),
            user: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Target database (SQLite) configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Path of the SQLite file. Deleted and recreated on every run.
    #[serde(default)]
    pub file: PathBuf,

    /// Encryption key applied with `PRAGMA key` (SQLCipher builds only).
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("file", &self.file)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Create the target schema but copy no rows.
    #[serde(default)]
    pub schema_only: bool,

    /// Echo every DDL/DML statement to stdout before executing it.
    #[serde(default)]
    pub log_query: bool,

    /// Compare source and target row counts after the copy.
    #[serde(default)]
    pub validate: bool,
}

fn default_mysql_host() -> String {
    "localhost".to_string()
}

fn default_mysql_port() -> u16 {
    3306
}
