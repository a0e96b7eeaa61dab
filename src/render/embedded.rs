//! Embedded HTML report lookup.

use serde_json::{Map, Value};

/// Keys that may carry the HTML report, in priority order.
pub const HTML_REPORT_KEYS: &[&str] = &["html_report", "html"];

const HTML_ROOT_MARKERS: &[&str] = &["<html", "<!doctype html"];

/// First non-empty string found under [`HTML_REPORT_KEYS`].
pub fn find_embedded_report(fields: &Map<String, Value>) -> Option<&str> {
    HTML_REPORT_KEYS
        .iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_str))
        .find(|html| !html.trim().is_empty())
}

/// Whether the string carries a recognizable HTML root marker.
pub fn looks_like_html(candidate: &str) -> bool {
    let lowered = candidate.to_ascii_lowercase();
    HTML_ROOT_MARKERS.iter().any(|marker| lowered.contains(marker))
}
