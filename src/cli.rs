//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap. Values left
//! unset here fall back to `.incident-intel.toml`, then to built-in defaults.

use crate::models::Audience;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Incident Intel - predict operational risks from cloud provider updates
///
/// Sends the run settings to an analysis workflow webhook and renders the
/// returned findings in the terminal.
///
/// Examples:
///   incident-intel --webhook https://xxxx.ngrok-free.app/webhook/aws-intel
///   incident-intel -w https://host/webhook/aws-intel --max-items 10 --audience manager
///   incident-intel --format markdown --output report.md --export-csv findings.csv
///   incident-intel --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Production webhook URL of the analysis workflow
    #[arg(short, long, value_name = "URL", env = "INCIDENT_INTEL_WEBHOOK")]
    pub webhook: Option<String>,

    /// Maximum number of update items the workflow should analyze
    ///
    /// Must be between 1 and the configured max_items_limit (default 50).
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub max_items: Option<u32>,

    /// Audience the analysis is written for
    #[arg(short, long, value_name = "AUDIENCE")]
    pub audience: Option<Audience>,

    /// Do not request or show the embedded HTML report
    #[arg(long)]
    pub no_html: bool,

    /// Ask the workflow for a higher-volume analysis pass
    #[arg(long)]
    pub scale_mode: bool,

    /// Request timeout in seconds (default: from config or 120s)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format for the rendered report (text, markdown, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the rendered report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Save the embedded HTML report to this file. Not saved otherwise
    #[arg(long, value_name = "FILE")]
    pub html_out: Option<PathBuf>,

    /// Export the findings table as CSV
    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    /// Hide the findings table
    #[arg(long)]
    pub no_table: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .incident-intel.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .incident-intel.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the rendered report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain terminal text (default)
    #[default]
    Text,
    /// Markdown with collapsible findings
    Markdown,
    /// Rendered sections as JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate flag combinations that clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}",
                    config_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
