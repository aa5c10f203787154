//! qualified-ddl CLI - show the DDL a project would run, without connecting.

use clap::{Parser, Subcommand};
use qualified_ddl::{render_sql, Config, DdlError, Orchestrator, DEFAULT_DB_ALIAS};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "qualified-ddl")]
#[command(about = "Schema-qualified DDL for MySQL, Oracle, PostgreSQL and SQLite")]
#[command(version)]
struct Cli {
    /// Path to YAML project file
    #[arg(short, long, default_value = "project.yaml")]
    config: PathBuf,

    /// Database alias to generate for
    #[arg(short, long, default_value = DEFAULT_DB_ALIAS)]
    database: String,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "warn")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full create script
    Sql,

    /// Print the CREATE INDEX statements
    SqlIndexes,

    /// Print the drop script
    SqlDrop,

    /// Print the resolved schema and quoted name of a model
    Qname {
        /// Model label, e.g. app.Book
        model: String,
    },

    /// List the schemas the models live in
    Schemas,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), DdlError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);
    let orchestrator = Orchestrator::from_config(&config, &cli.database)?;

    match cli.command {
        Commands::Sql => {
            let plan = orchestrator.create_plan()?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{}", render_sql(&plan.as_sql()));
            }
        }
        Commands::SqlIndexes => print_statements(&orchestrator.index_plan(), cli.output_json)?,
        Commands::SqlDrop => print_statements(&orchestrator.drop_plan()?, cli.output_json)?,
        Commands::Qname { model } => {
            let name = orchestrator.describe(&model)?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&name)?);
            } else {
                println!(
                    "{}\t{}",
                    name.schema.as_deref().unwrap_or("-"),
                    name.composed
                );
            }
        }
        Commands::Schemas => {
            let schemas = orchestrator.schemas();
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&schemas)?);
            } else {
                for schema in schemas {
                    println!("{}", schema);
                }
            }
        }
    }

    Ok(())
}

fn print_statements(statements: &[String], output_json: bool) -> Result<(), DdlError> {
    if output_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "statements": statements }))?
        );
    } else {
        print!("{}", render_sql(statements));
    }
    Ok(())
}

/// Logs go to stderr so stdout stays a clean script.
fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
