//! Configuration file handling.
//!
//! This module handles loading `.incident-intel.toml` and merging it with
//! command-line arguments.

use crate::cli::{Args, OutputFormat};
use crate::models::{AnalysisRequest, Audience};
use crate::render::RenderOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".incident-intel.toml";

/// Problems that block the webhook call before any network attempt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Please provide the webhook URL (--webhook or [webhook] url in .incident-intel.toml)")]
    MissingWebhookUrl,

    #[error("Webhook URL must start with 'http://' or 'https://': {0}")]
    InvalidWebhookUrl(String),

    #[error("Max items must be between 1 and {limit}, got {value}")]
    MaxItemsOutOfRange { value: u32, limit: u32 },

    #[error("Timeout must be at least 1 second")]
    ZeroTimeout,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Webhook settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Request settings.
    #[serde(default)]
    pub request: RequestConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where and how long to call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Production webhook URL of the analysis workflow.
    #[serde(default)]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}

/// Values forwarded in the request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_max_items")]
    pub max_items: u32,

    /// Upper bound the operator may ask for.
    #[serde(default = "default_max_items_limit")]
    pub max_items_limit: u32,

    #[serde(default)]
    pub audience: Audience,

    #[serde(default = "default_true")]
    pub include_html: bool,

    #[serde(default)]
    pub scale_mode: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_items_limit: default_max_items_limit(),
            audience: Audience::default(),
            include_html: true,
            scale_mode: false,
        }
    }
}

fn default_max_items() -> u32 {
    20
}

fn default_max_items_limit() -> u32 {
    50
}

fn default_true() -> bool {
    true
}

/// Presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Show the findings table.
    #[serde(default = "default_true")]
    pub show_table: bool,

    /// Only treat the embedded report as HTML if it has a root marker.
    #[serde(default = "default_true")]
    pub require_html_marker: bool,

    /// Where the embedded HTML report is written. Unset means not saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_out: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            show_table: true,
            require_html_marker: true,
            html_out: None,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line override the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref url) = args.webhook {
            self.webhook.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.webhook.timeout_seconds = timeout;
        }

        if let Some(max_items) = args.max_items {
            self.request.max_items = max_items;
        }
        if let Some(audience) = args.audience {
            self.request.audience = audience;
        }
        if args.no_html {
            self.request.include_html = false;
        }
        if args.scale_mode {
            self.request.scale_mode = true;
        }

        if let Some(format) = args.format {
            self.output.format = format;
        }
        if args.no_table {
            self.output.show_table = false;
        }
        if let Some(ref html_out) = args.html_out {
            self.output.html_out = Some(html_out.display().to_string());
        }
    }

    /// Check everything that must hold before the webhook is called.
    ///
    /// Returns the trimmed webhook URL.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        let url = self.webhook.url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingWebhookUrl);
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidWebhookUrl(url.to_string()));
        }

        let limit = self.request.max_items_limit;
        if self.request.max_items == 0 || self.request.max_items > limit {
            return Err(ConfigError::MaxItemsOutOfRange {
                value: self.request.max_items,
                limit,
            });
        }

        if self.webhook.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(url)
    }

    /// Request body built from the current settings.
    pub fn analysis_request(&self) -> AnalysisRequest {
        AnalysisRequest {
            max_items: self.request.max_items,
            audience: self.request.audience,
            include_html: self.request.include_html,
            scale_mode: self.request.scale_mode,
        }
    }

    /// Rendering switches matching the request that was sent.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            include_html: self.request.include_html,
            require_html_marker: self.output.require_html_marker,
            show_table: self.output.show_table,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
