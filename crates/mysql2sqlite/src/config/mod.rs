//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use sqlx::sqlite::SqliteConnectOptions;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// The result is not validated yet: flags may still fill in required
    /// fields. Call [`Config::validate`] once all layers are applied.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Build sqlx connect options for the MySQL source.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .ssl_mode(MySqlSslMode::Preferred)
            .charset("utf8mb4");

        if !self.user.is_empty() {
            options = options.username(&self.user);
        }
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        options
    }
}

impl TargetConfig {
    /// Build sqlx connect options for the SQLite target.
    pub fn connect_options(&self) -> SqliteConnectOptions {
        let mut options = SqliteConnectOptions::new()
            .filename(&self.file)
            .create_if_missing(true);

        if !self.password.is_empty() {
            options = options.pragma("key", format!("'{}'", self.password.replace('\'', "''")));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_yaml_defaults() {
        let config = Config::from_yaml(
            r#"
source:
  database: shop
  user: root
target:
  file: /tmp/shop.sqlite
"#,
        )
        .unwrap();

        assert_eq!(config.source.host, "localhost");
        assert_eq!(config.source.port, 3306);
        assert_eq!(config.source.database, "shop");
        assert!(!config.migration.schema_only);
        assert!(!config.migration.log_query);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_migration_flags() {
        let config = Config::from_yaml(
            r#"
source:
  host: db.internal
  port: 3307
  database: shop
target:
  file: out.sqlite
migration:
  schema_only: true
  log_query: true
"#,
        )
        .unwrap();

        assert_eq!(config.source.host, "db.internal");
        assert_eq!(config.source.port, 3307);
        assert!(config.migration.schema_only);
        assert!(config.migration.log_query);
        assert!(!config.migration.validate);
    }

    #[test]
    fn test_from_yaml_invalid() {
        assert!(Config::from_yaml("source: [").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "source:\n  database: shop\ntarget:\n  file: shop.sqlite").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.source.database, "shop");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("definitely_missing_config.yaml").unwrap_err();
        assert!(matches!(err, crate::error::MigrateError::Io(_)));
    }
}
