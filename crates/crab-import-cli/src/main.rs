//! crab-import CLI - load a directory of CRAB dBase exports into PostgreSQL.

use clap::Parser;
use crab_import::{Config, ImportError, Orchestrator, PgDestination};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "crab-import")]
#[command(about = "Load CRAB dBase exports into PostgreSQL")]
#[command(version)]
struct Cli {
    /// Directory containing the .dbf files
    path: PathBuf,

    /// Path to YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append the validity and provenance metadata columns
    #[arg(long)]
    with_metadata: bool,

    /// Rows per committed batch
    #[arg(long)]
    commit_threshold: Option<usize>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info", value_parser = ["debug", "info", "warn", "error"])]
    verbosity: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), ImportError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)
                .map_err(|e| ImportError::Config(format!("{}: {}", path.display(), e)))?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    // Apply overrides
    if cli.with_metadata {
        config.import.with_metadata = true;
    }
    if let Some(threshold) = cli.commit_threshold {
        config.import.commit_threshold = threshold;
    }
    config.validate()?;

    let orchestrator = Orchestrator::new(config);

    // Fail on an empty directory before touching the database
    let files = orchestrator.scan(&cli.path)?;
    info!("Found {} files in {}", files.len(), cli.path.display());

    let mut dest = PgDestination::connect(&orchestrator.config().target).await?;
    let outcome = orchestrator.run(&files, &mut dest).await;
    let closed = dest.close().await;
    let result = outcome?;
    closed?;

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        println!("Import completed!");
        println!("  Files: {}", result.files_total);
        println!("  Tables: {}", result.tables.join(", "));
        println!("  Rows: {}", result.rows_imported);
        println!("  Duration: {:.2}s", result.duration_seconds);
        println!("  Throughput: {} rows/sec", result.rows_per_second);
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
