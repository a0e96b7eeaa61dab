//! Incident Intel - terminal front end for webhook-driven risk analysis
//!
//! Posts the run settings to an analysis workflow webhook and renders the
//! returned findings as a summary, numbered risks, a table and an optional
//! embedded HTML report.
//!
//! Exit codes:
//!   0 - Success (with or without findings)
//!   1 - Error (configuration, timeout, connection, HTTP status, bad payload)

mod cli;
mod config;
mod dispatch;
mod models;
mod render;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use dispatch::WebhookClient;
use indicatif::{ProgressBar, ProgressStyle};
use render::{FindingsTable, Section};
use report::ReportContext;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("Incident Intel v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_analysis(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            debug!("Analysis failed: {:?}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .incident-intel.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Set [webhook] url to your workflow's production webhook.");
    Ok(())
}

/// Initialize logging on stderr; stdout carries the report.
fn init_logging(args: &Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// One call-and-render run. Returns the exit code.
async fn run_analysis(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Configuration errors block the call entirely
    let url = config.validate()?.to_string();
    let request = config.analysis_request();
    let timeout = config.webhook.timeout_seconds;

    let client = WebhookClient::new(timeout)?;

    let spinner = start_spinner(args.quiet, timeout);
    let result = client.dispatch(&url, &request).await;
    spinner.finish_and_clear();

    // Failures end the run here, before anything is rendered
    let data = result?;
    status(&args, "✅ Analysis complete");

    let sections = render::render(Some(&data), &config.render_options());

    // The HTML report is only saved when the operator names a file
    let html_out = match (embedded_report(&sections), config.output.html_out.as_deref()) {
        (Some(html), Some(html_out)) => {
            let path = PathBuf::from(html_out);
            std::fs::write(&path, html).with_context(|| {
                format!("Failed to write HTML report to {}", path.display())
            })?;
            info!("Embedded report saved to {}", path.display());
            Some(path)
        }
        _ => None,
    };

    if let Some(ref csv_path) = args.export_csv {
        export_csv(&sections, csv_path)?;
    }

    let context = ReportContext {
        run_at: Utc::now(),
        request,
        html_out,
    };
    let output = report::generate_report(config.output.format, &sections, &context)?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            status(&args, &format!("📝 Report saved to: {}", path.display()));
        }
        None => print!("{}", output),
    }

    Ok(0)
}

/// Progress line on stderr, silenced by --quiet.
fn status(args: &Args, message: &str) {
    if !args.quiet {
        eprintln!("{}", message);
    }
}

fn start_spinner(quiet: bool, timeout: u64) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Analyzing updates (timeout {}s)...", timeout));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn embedded_report(sections: &[Section]) -> Option<&str> {
    sections.iter().find_map(|section| match section {
        Section::EmbeddedReport { html } => Some(html.as_str()),
        _ => None,
    })
}

/// Export the findings table, whether or not it is displayed.
fn export_csv(sections: &[Section], path: &Path) -> Result<()> {
    let table = sections
        .iter()
        .find_map(|section| match section {
            Section::Findings { findings } => Some(FindingsTable::from_findings(findings)),
            _ => None,
        })
        .unwrap_or_else(|| FindingsTable::from_findings(&[]));

    if table.is_empty() {
        warn!("No findings to export, skipping {}", path.display());
        return Ok(());
    }

    render::write_csv(&table, path)?;
    info!("Exported {} findings to {}", table.rows.len(), path.display());
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e.context(format!("Failed to load {}", CONFIG_FILE_NAME))),
    }
}
