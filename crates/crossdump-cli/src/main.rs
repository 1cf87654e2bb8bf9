mod config;
mod connection;
mod logging;
mod output;
mod redaction;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;

use crossdump_core::{
    ConflictMode, Dialect, Error as CoreError, RelationKind, TableSchema, dependency_order,
};
use crossdump_engine::{DumpOptions, DumpStats, DumpWarning, generate_sql_dump_report};
use crossdump_introspect::{IntrospectOptions, SourceAdapter};

use config::{CliConfig, load_config};
use connection::{connect, detect_dialect};
use logging::init_logging;
use output::{write_bytes_atomic, write_json_atomic};
use redaction::{RedactedConnection, redact_connection_string};

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    #[error("foreign keys form a cycle between: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),
}

#[derive(Parser, Debug)]
#[command(name = "crossdump", version, about = "Cross-dialect SQL dump tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump a database as a SQL script for another engine.
    Dump(DumpArgs),
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Source connection string (sqlite:, mysql:, mariadb:, postgres:).
    #[arg(value_name = "CONNECTION_STRING")]
    conn: String,
    /// Dialect of the generated script.
    #[arg(long, value_name = "DIALECT")]
    target: Option<Dialect>,
    /// Write the script here instead of stdout.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Relation to dump; repeat to dump several, in the given order.
    #[arg(long = "table", value_name = "NAME")]
    tables: Vec<String>,
    /// Rows per INSERT statement.
    #[arg(long, value_name = "N")]
    chunk_size: Option<u64>,
    /// Emit DDL only.
    #[arg(long, default_value_t = false, conflicts_with = "chunk_size")]
    schema_only: bool,
    #[arg(long, default_value_t = false)]
    no_header: bool,
    /// Emit data only.
    #[arg(long, default_value_t = false)]
    no_schema: bool,
    /// Conflict handling for INSERTs: ignore, replace or none.
    #[arg(long, value_name = "MODE")]
    conflict: Option<ConflictMode>,
    /// Drop unsupported constraints with a warning instead of failing.
    #[arg(long, default_value_t = false)]
    lenient: bool,
    /// Order tables so referenced tables come first.
    #[arg(long, default_value_t = false)]
    fk_order: bool,
    /// TOML file with a `[dump]` table.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Write warnings and counts as JSON.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
    /// Append JSON log lines here instead of logging to stderr.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl DumpArgs {
    /// Layer command-line flags over the config file.
    fn resolve(&self, config: CliConfig) -> Result<(Dialect, DumpOptions), CliError> {
        let target = self.target.or(config.target).ok_or_else(|| {
            CliError::InvalidConfig("--target is required unless the config file sets it".to_string())
        })?;

        let mut options = config.dump;
        if !self.tables.is_empty() {
            options.tables = Some(self.tables.clone());
        }
        if let Some(chunk_size) = self.chunk_size {
            options.chunk_size = chunk_size;
        }
        if self.schema_only {
            options.chunk_size = 0;
        }
        if self.no_header {
            options.include_header = false;
        }
        if self.no_schema {
            options.include_schema = false;
        }
        if let Some(mode) = self.conflict {
            options.conflict_mode = mode;
        }
        if self.lenient {
            options.lenient_constraints = true;
        }

        options.validate()?;
        Ok((target, options))
    }
}

#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    connection: &'a RedactedConnection,
    source: Dialect,
    target: Dialect,
    generated_at: chrono::DateTime<chrono::Utc>,
    out: Option<&'a PathBuf>,
    warnings: &'a [DumpWarning],
    stats: &'a DumpStats,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Dump(args) => run_dump(args).await,
    }
}

async fn run_dump(args: DumpArgs) -> Result<(), CliError> {
    init_logging(args.log_file.as_deref())?;

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => CliConfig::default(),
    };
    let (target, mut options) = args.resolve(config)?;

    let connection = redact_connection_string(&args.conn);
    let source = detect_dialect(&args.conn)?;
    tracing::info!(
        event = "run_started",
        connection = %connection.redacted,
        source = %source,
        target = %target
    );

    let timer = Instant::now();
    let adapter = connect(&args.conn).await?;

    if args.fk_order {
        let ordered = fk_ordered_relations(adapter.as_ref(), target, &options).await?;
        tracing::info!(event = "fk_order_applied", relations = ordered.len());
        options.tables = Some(ordered);
    }

    let dump = generate_sql_dump_report(adapter.as_ref(), target, &options).await?;

    match &args.out {
        Some(path) => {
            write_bytes_atomic(path, dump.sql.as_bytes())?;
            tracing::info!(event = "script_written", path = %path.display(), bytes = dump.sql.len());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(dump.sql.as_bytes())?;
            stdout.flush()?;
        }
    }

    if let Some(path) = &args.report {
        let report = ReportFile {
            connection: &connection,
            source: dump.source,
            target: dump.target,
            generated_at: chrono::Utc::now(),
            out: args.out.as_ref(),
            warnings: &dump.warnings,
            stats: &dump.stats,
        };
        write_json_atomic(path, &report)?;
        tracing::info!(event = "report_written", path = %path.display());
    }

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(
        event = "run_finished",
        status = "success",
        warnings = dump.warnings.len(),
        duration_ms = duration_ms
    );

    Ok(())
}

/// The requested relations with tables rearranged parent-first and views
/// kept after them in the requested order.
async fn fk_ordered_relations(
    adapter: &dyn SourceAdapter,
    target: Dialect,
    options: &DumpOptions,
) -> Result<Vec<String>, CliError> {
    let introspect =
        IntrospectOptions::new(target).with_type_overrides(options.type_overrides.clone());
    let relations = adapter.list_relations(&introspect).await?;

    let requested: Vec<&str> = match &options.tables {
        Some(names) => names.iter().map(String::as_str).collect(),
        None => relations
            .iter()
            .filter(|relation| !options.is_internal(&relation.name))
            .map(|relation| relation.name.as_str())
            .collect(),
    };

    let mut tables: Vec<TableSchema> = Vec::new();
    let mut views = Vec::new();
    for name in requested {
        match relations.iter().find(|relation| relation.name == name) {
            Some(relation) if relation.kind == RelationKind::Table => {
                tables.push(adapter.introspect_table(name, &introspect).await?.table);
            }
            // Unknown names are reported by the dump itself.
            _ => views.push(name.to_string()),
        }
    }

    let report = dependency_order(&tables);
    match (report.order, report.cycle) {
        (Some(mut order), _) => {
            order.extend(views);
            Ok(order)
        }
        (None, cycle) => Err(CliError::DependencyCycle(cycle.unwrap_or_default())),
    }
}
