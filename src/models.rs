//! Data models for the incident analysis client.
//!
//! The outbound request is fully typed. The inbound response is produced by
//! an external workflow and is read leniently: every field has a default,
//! and `items` is normalized to a list exactly once, in
//! [`AnalysisResponse::from_value`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Audience the remote analysis is framed for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Audience {
    /// Engineers operating the affected cloud resources
    #[default]
    CloudEngineer,
    /// Application developers
    Developer,
    /// Engineering management
    Manager,
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::CloudEngineer => write!(f, "cloud_engineer"),
            Audience::Developer => write!(f, "developer"),
            Audience::Manager => write!(f, "manager"),
        }
    }
}

/// Body POSTed to the webhook. All four fields are always sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    /// Maximum number of upstream items the workflow should look at.
    pub max_items: u32,
    /// Audience selector, forwarded as-is.
    pub audience: Audience,
    /// Ask the workflow for an embeddable HTML report.
    pub include_html: bool,
    /// Opaque high-volume switch owned by the workflow.
    pub scale_mode: bool,
}

/// Displayed when a finding carries no urgency label.
pub const UNKNOWN_URGENCY: &str = "Unknown";

/// Displayed when the response carries no timestamp.
pub const MISSING_TIMESTAMP: &str = "-";

/// One risk record returned by the workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Severity label such as "P0". Not validated.
    pub urgency: Option<String>,
    pub reason: String,
    pub impacted_services: Vec<String>,
    pub tags: Vec<String>,
    pub action_recommendation: String,
    /// Every key of the raw record, kept for the tabular projection.
    #[serde(skip)]
    pub fields: Map<String, Value>,
}

impl Finding {
    /// Build a finding from a raw JSON record, defaulting missing keys.
    pub fn from_record(record: Map<String, Value>) -> Self {
        Self {
            urgency: record
                .get("urgency")
                .and_then(display_scalar)
                .filter(|u| !u.is_empty()),
            reason: record.get("reason").and_then(display_scalar).unwrap_or_default(),
            impacted_services: record
                .get("impacted_services")
                .map(string_list)
                .unwrap_or_default(),
            tags: record.get("tags").map(string_list).unwrap_or_default(),
            action_recommendation: record
                .get("action_recommendation")
                .and_then(display_scalar)
                .unwrap_or_default(),
            fields: record,
        }
    }

    /// Urgency label for display.
    pub fn urgency_label(&self) -> &str {
        self.urgency.as_deref().unwrap_or(UNKNOWN_URGENCY)
    }

    /// Impacted services joined for display. Empty list gives an empty string.
    pub fn services_display(&self) -> String {
        self.impacted_services.join(", ")
    }

    /// Tags joined for display. Empty list gives an empty string.
    pub fn tags_display(&self) -> String {
        self.tags.join(", ")
    }
}

/// Normalized view of the workflow response.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub generated_at: String,
    pub total_items_analyzed: u64,
    pub items: Vec<Finding>,
    /// Every top-level key, kept for embedded report lookup.
    pub fields: Map<String, Value>,
}

impl AnalysisResponse {
    /// Read a response leniently. Never fails: wrong-shaped or missing
    /// fields fall back to their defaults, and a non-object body is read
    /// as an empty object.
    pub fn from_value(value: &Value) -> Self {
        let fields = match value {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        let generated_at = fields
            .get("generated_at")
            .and_then(display_scalar)
            .unwrap_or_else(|| MISSING_TIMESTAMP.to_string());

        let total_items_analyzed = fields
            .get("total_items_analyzed")
            .and_then(read_count)
            .unwrap_or(0);

        let items = normalize_items(fields.get("items"))
            .into_iter()
            .map(Finding::from_record)
            .collect();

        Self {
            generated_at,
            total_items_analyzed,
            items,
            fields,
        }
    }
}

/// Collapse `Finding | [Finding]` into `[Finding]`.
///
/// A bare object becomes a one-element list. Array elements that are not
/// objects are dropped. Anything else, including an absent key, is empty.
pub fn normalize_items(items: Option<&Value>) -> Vec<Map<String, Value>> {
    match items {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Object(record) => Some(record.clone()),
                other => {
                    tracing::debug!("Skipping non-object finding: {}", other);
                    None
                }
            })
            .collect(),
        Some(Value::Object(record)) => vec![record.clone()],
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            tracing::debug!("Ignoring items of unexpected shape: {}", other);
            Vec::new()
        }
    }
}

/// Text for a scalar JSON value. Null yields `None`.
pub fn display_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Text for any JSON value as a table cell. Arrays are joined, null is empty.
pub fn display_cell(value: &Value) -> String {
    match value {
        Value::Array(_) => string_list(value).join(", "),
        other => display_scalar(other).unwrap_or_default(),
    }
}

/// Read a list of strings. A bare string becomes one element, null or
/// other scalars an empty list.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries.iter().filter_map(display_scalar).collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn read_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
