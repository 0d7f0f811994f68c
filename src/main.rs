//! CLI entry point for the DU processing-speed analysis.
//!
//! Provides subcommands for extracting daily totals from an ERP export,
//! aggregating them, rendering the report, or running all three in order.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use du_speed::analyzers::analyzer::{analyze, write_views};
use du_speed::config::Config;
use du_speed::extract::extract;
use du_speed::pipeline;
use du_speed::report::generate_report;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "du_speed")]
#[command(about = "Compare daily processing time after DU import across scenarios", long_about = None)]
struct Cli {
    /// JSON configuration file; built-in defaults when omitted
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract daily totals from an HTML export into the canonical store
    Extract {
        /// Path or URL of the export
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Canonical store to replace
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Derive rolling, acceleration and weekly views from the store
    Aggregate {
        /// Canonical store to read
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Directory to write the views to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Render charts, views, report.md, report.docx and summary.json from the store
    Report {
        /// Canonical store to read
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Directory to write the report to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Extract, aggregate and report in one go
    Run {
        /// Path or URL of the export
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Directory to write the views and report to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/du_speed.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("du_speed.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let message = format!("{e:#}");
        error!(error = %message, "Pipeline failed");
        eprintln!("error: {message}");
        // process::exit skips destructors; flush the log file first
        drop(file_guard);
        std::process::exit(1);
    }
}

/// Filter from `var`, falling back to `default` when unset or invalid.
fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("loading config {}", path.display()),
        None => "building default config".to_string(),
    })?;

    match cli.command {
        Commands::Extract { source, store } => {
            let source = source.unwrap_or_else(|| config.paths.source.clone());
            let store = store.unwrap_or_else(|| config.paths.store.clone());
            extract(&source, &store, &config).with_context(|| format!("extracting {}", source))?;
        }
        Commands::Aggregate { store, output_dir } => {
            let store = store.unwrap_or_else(|| config.paths.store.clone());
            let out_dir = output_dir.unwrap_or_else(|| config.paths.output_dir.clone());
            let (_, aggregation) =
                analyze(&store, &config).with_context(|| format!("aggregating {}", store.display()))?;
            write_views(&out_dir, &aggregation)
                .with_context(|| format!("writing views to {}", out_dir.display()))?;
        }
        Commands::Report { store, output_dir } => {
            let store = store.unwrap_or_else(|| config.paths.store.clone());
            let out_dir = output_dir.unwrap_or_else(|| config.paths.output_dir.clone());
            let (_, aggregation) =
                analyze(&store, &config).with_context(|| format!("aggregating {}", store.display()))?;
            generate_report(&aggregation, &config, &out_dir)
                .with_context(|| format!("rendering report into {}", out_dir.display()))?;
        }
        Commands::Run { source, output_dir } => {
            let source = source.unwrap_or_else(|| config.paths.source.clone());
            let out_dir = output_dir.unwrap_or_else(|| config.paths.output_dir.clone());
            pipeline::run(&source, &config, &out_dir)
                .with_context(|| format!("running {} into {}", source, out_dir.display()))?;
        }
    }

    Ok(())
}
