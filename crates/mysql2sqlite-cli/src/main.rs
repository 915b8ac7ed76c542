//! mysql2sqlite CLI - migrate a MySQL database into a SQLite file.

use clap::error::ErrorKind;
use clap::Parser;
use mysql2sqlite::{Config, MigrateError, MigrationResult, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mysql2sqlite")]
#[command(about = "Migrate a MySQL database (schema and data) into a SQLite file")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Target SQLite file (deleted and recreated if it exists)
    #[arg(long = "sqliteFile", value_name = "PATH")]
    sqlite_file: Option<PathBuf>,

    /// Target encryption key (requires SQLite built with SQLCipher)
    #[arg(long = "sqlitePassword", value_name = "PASSWORD")]
    sqlite_password: Option<String>,

    /// Source login user
    #[arg(long = "mysqlUser", value_name = "USER")]
    mysql_user: Option<String>,

    /// Source login password
    #[arg(long = "mysqlPassword", value_name = "PASSWORD")]
    mysql_password: Option<String>,

    /// Source database to migrate
    #[arg(long = "mysqlDatabase", value_name = "NAME")]
    mysql_database: Option<String>,

    /// Source server address [default: localhost]
    #[arg(long = "mysqlHost", value_name = "HOST")]
    mysql_host: Option<String>,

    /// Source server port [default: 3306]
    #[arg(long = "mysqlPort", value_name = "PORT")]
    mysql_port: Option<u16>,

    /// 1 creates the schema only and copies no rows
    #[arg(long = "schemaOnly", value_name = "0|1", value_parser = parse_switch,
          num_args = 0..=1, default_missing_value = "1")]
    schema_only: Option<bool>,

    /// 1 echoes every DDL/DML statement to stdout
    #[arg(long = "logQuery", value_name = "0|1", value_parser = parse_switch,
          num_args = 0..=1, default_missing_value = "1")]
    log_query: Option<bool>,

    /// 1 compares source and target row counts after the copy
    #[arg(long = "validate", value_name = "0|1", value_parser = parse_switch,
          num_args = 0..=1, default_missing_value = "1")]
    validate: Option<bool>,

    /// 1 prints the migration result as JSON
    #[arg(long = "outputJson", value_name = "0|1", value_parser = parse_switch,
          num_args = 0..=1, default_missing_value = "1")]
    output_json: Option<bool>,

    /// Optional YAML configuration file; flags override its values
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Log format: text or json
    #[arg(long = "logFormat", default_value = "text")]
    log_format: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout; usage errors are config errors.
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(mysql2sqlite::error::EXIT_CONFIG_ERROR),
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), MigrateError> {
    setup_logging(&cli.verbosity, &cli.log_format);

    let config = build_config(&cli)?;
    if let Some(path) = &cli.config {
        info!("Loaded configuration from {:?}", path);
    }

    let orchestrator = Orchestrator::new(config).await?;
    let result = orchestrator.run().await?;

    if cli.output_json.unwrap_or(false) {
        println!("{}", result.to_json()?);
    } else {
        print_summary(&result);
    }

    Ok(())
}

/// Layer command-line flags over the optional YAML file.
fn build_config(cli: &Cli) -> Result<Config, MigrateError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(file) = &cli.sqlite_file {
        config.target.file = file.clone();
    }
    if let Some(password) = &cli.sqlite_password {
        config.target.password = password.clone();
    }
    if let Some(user) = &cli.mysql_user {
        config.source.user = user.clone();
    }
    if let Some(password) = &cli.mysql_password {
        config.source.password = password.clone();
    }
    if let Some(database) = &cli.mysql_database {
        config.source.database = database.clone();
    }
    if let Some(host) = &cli.mysql_host {
        config.source.host = host.clone();
    }
    if let Some(port) = cli.mysql_port {
        config.source.port = port;
    }
    if let Some(v) = cli.schema_only {
        config.migration.schema_only = v;
    }
    if let Some(v) = cli.log_query {
        config.migration.log_query = v;
    }
    if let Some(v) = cli.validate {
        config.migration.validate = v;
    }

    config.validate()?;
    Ok(config)
}

/// Parse a `0`/`1` switch value.
fn parse_switch(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(format!("expected 0 or 1, got '{}'", other)),
    }
}

fn print_summary(result: &MigrationResult) {
    let status_msg = if result.has_failures() {
        "Migration completed with errors"
    } else {
        "Migration completed!"
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", result.run_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!(
        "  Tables: {}/{}",
        result.tables_created, result.tables_total
    );
    println!("  Rows: {}", result.rows_transferred);
    if result.rows_failed > 0 {
        println!("  Failed rows: {}", result.rows_failed);
    }
    println!("  Throughput: {} rows/sec", result.rows_per_second);

    if let Some(checks) = &result.validation {
        let mismatched = checks.iter().filter(|c| !c.matches()).count();
        println!(
            "  Validation: {}/{} tables match",
            checks.len() - mismatched,
            checks.len()
        );
    }

    if result.has_failures() {
        println!("  Failures: {}", result.failures.len());
        for failure in &result.failures {
            println!("    {}: {}", failure.object, failure.error);
        }
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG, when set, takes precedence over --verbosity.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    // stdout carries the query echo and the summary only.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
