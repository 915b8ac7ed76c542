//! Checks run on a merged configuration before any connection is opened.

use super::{Config, SourceConfig, TargetConfig};
use crate::error::{MigrateError, Result};

/// Reject a configuration that cannot describe a run.
pub fn validate(config: &Config) -> Result<()> {
    check_source(&config.source)?;
    check_target(&config.target)
}

fn check_source(source: &SourceConfig) -> Result<()> {
    if source.database.is_empty() {
        return Err(invalid("source.database is required (--mysqlDatabase)"));
    }
    if source.host.is_empty() {
        return Err(invalid("source.host must not be empty (--mysqlHost)"));
    }
    if source.port == 0 {
        return Err(invalid("source.port must be between 1 and 65535 (--mysqlPort)"));
    }
    Ok(())
}

fn check_target(target: &TargetConfig) -> Result<()> {
    if target.file.as_os_str().is_empty() {
        return Err(invalid("target.file is required (--sqliteFile)"));
    }
    // The file is deleted before the run; a directory cannot be.
    if target.file.is_dir() {
        return Err(MigrateError::Config(format!(
            "target.file {:?} is a directory",
            target.file
        )));
    }
    Ok(())
}

fn invalid(message: &str) -> MigrateError {
    MigrateError::Config(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrationConfig;
    use std::path::PathBuf;

    fn shop() -> Config {
        Config {
            source: SourceConfig {
                host: "db.internal".to_string(),
                port: 3306,
                database: "shop".to_string(),
                user: "reporter".to_string(),
                password: "hunter2".to_string(),
            },
            target: TargetConfig {
                file: PathBuf::from("shop.sqlite"),
                password: String::new(),
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_complete_config_passes() {
        assert!(validate(&shop()).is_ok());
    }

    #[test]
    fn test_empty_user_and_password_allowed() {
        let mut config = shop();
        config.source.user.clear();
        config.source.password.clear();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_database_names_flag() {
        let mut config = shop();
        config.source.database.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("--mysqlDatabase"));
    }

    #[test]
    fn test_missing_sqlite_file_names_flag() {
        let mut config = shop();
        config.target.file = PathBuf::new();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("--sqliteFile"));
    }

    #[test]
    fn test_empty_host_and_zero_port_rejected() {
        let mut config = shop();
        config.source.host.clear();
        assert!(matches!(validate(&config), Err(MigrateError::Config(_))));

        let mut config = shop();
        config.source.port = 0;
        assert!(matches!(validate(&config), Err(MigrateError::Config(_))));
    }

    #[test]
    fn test_directory_target_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = shop();
        config.target.file = dir.path().to_path_buf();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }

    #[test]
    fn test_debug_output_hides_passwords() {
        let mut config = shop();
        config.target.password = "sqlite-key".to_string();

        let source = format!("{:?}", config.source);
        let target = format!("{:?}", config.target);
        assert!(!source.contains("hunter2"));
        assert!(!target.contains("sqlite-key"));
        assert!(source.contains("[REDACTED]"));
    }
}
