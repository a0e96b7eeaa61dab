//! Response rendering.
//!
//! Turns the raw workflow response into a fixed sequence of display
//! sections. Rendering never fails: every field has a default, and each
//! section degrades on its own.

pub mod embedded;
pub mod table;

use crate::models::{AnalysisResponse, Finding};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use embedded::{find_embedded_report, looks_like_html};
pub use table::{write_csv, FindingsTable};

/// Switches that decide which optional sections are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// The operator asked for the HTML report when the request was sent.
    pub include_html: bool,
    /// Require an HTML root marker before treating a string as a report.
    pub require_html_marker: bool,
    /// Produce the tabular projection of the findings.
    pub show_table: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_html: true,
            require_html_marker: true,
            show_table: true,
        }
    }
}

/// Run metadata shown at the top of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub generated_at: String,
    pub total_items_analyzed: u64,
}

/// One display section, in rendering order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum Section {
    Summary(SummarySection),
    /// Numbered findings. An empty list is the "no findings" indicator.
    Findings { findings: Vec<Finding> },
    Table(FindingsTable),
    EmbeddedReport { html: String },
}

/// Render a response into its display sections.
///
/// `None` means the call failed and the error has already been reported,
/// so nothing is rendered.
pub fn render(response: Option<&Value>, options: &RenderOptions) -> Vec<Section> {
    let Some(value) = response else {
        return Vec::new();
    };

    let response = AnalysisResponse::from_value(value);
    debug!(
        "Rendering response with {} findings ({} top-level keys)",
        response.items.len(),
        response.fields.len()
    );

    let mut sections = vec![
        Section::Summary(SummarySection {
            generated_at: response.generated_at.clone(),
            total_items_analyzed: response.total_items_analyzed,
        }),
        Section::Findings {
            findings: response.items.clone(),
        },
    ];

    if options.show_table && !response.items.is_empty() {
        sections.push(Section::Table(FindingsTable::from_findings(&response.items)));
    }

    if options.include_html {
        match find_embedded_report(&response.fields) {
            Some(html) if !options.require_html_marker || looks_like_html(html) => {
                sections.push(Section::EmbeddedReport {
                    html: html.to_string(),
                });
            }
            Some(_) => debug!("Embedded report has no HTML root marker, skipping"),
            None => debug!("No embedded report in response"),
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn findings_of(sections: &[Section]) -> &[Finding] {
        sections
            .iter()
            .find_map(|s| match s {
                Section::Findings { findings } => Some(findings.as_slice()),
                _ => None,
            })
            .expect("findings section is always rendered")
    }

    fn embedded_of(sections: &[Section]) -> Option<&str> {
        sections.iter().find_map(|s| match s {
            Section::EmbeddedReport { html } => Some(html.as_str()),
            _ => None,
        })
    }

    #[test]
    fn test_absent_response_renders_nothing() {
        assert!(render(None, &RenderOptions::default()).is_empty());
    }

    #[test]
    fn test_sections_are_in_fixed_order() {
        let response = json!({
            "items": [{"urgency": "P0"}],
            "html_report": "<html><body>r</body></html>"
        });
        let sections = render(Some(&response), &RenderOptions::default());

        assert!(matches!(sections[0], Section::Summary(_)));
        assert!(matches!(sections[1], Section::Findings { .. }));
        assert!(matches!(sections[2], Section::Table(_)));
        assert!(matches!(sections[3], Section::EmbeddedReport { .. }));
    }

    #[test]
    fn test_summary_defaults_and_literals() {
        let sections = render(Some(&json!({})), &RenderOptions::default());
        assert_eq!(
            sections[0],
            Section::Summary(SummarySection {
                generated_at: "-".to_string(),
                total_items_analyzed: 0,
            })
        );

        let sections = render(
            Some(&json!({"generated_at": "2024-01-01T00:00:00Z", "total_items_analyzed": 2})),
            &RenderOptions::default(),
        );
        assert_eq!(
            sections[0],
            Section::Summary(SummarySection {
                generated_at: "2024-01-01T00:00:00Z".to_string(),
                total_items_analyzed: 2,
            })
        );
    }

    #[test]
    fn test_empty_items_render_no_findings_and_no_table() {
        let sections = render(Some(&json!({"items": []})), &RenderOptions::default());
        assert!(findings_of(&sections).is_empty());
        assert!(!sections.iter().any(|s| matches!(s, Section::Table(_))));
    }

    #[test]
    fn test_bare_object_items_render_one_finding() {
        let sections = render(
            Some(&json!({"items": {"urgency": "P1", "reason": "x", "action_recommendation": "y"}})),
            &RenderOptions::default(),
        );
        let findings = findings_of(&sections);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].urgency_label(), "P1");
    }

    #[test]
    fn test_include_html_false_never_embeds() {
        let options = RenderOptions {
            include_html: false,
            ..RenderOptions::default()
        };
        let sections = render(
            Some(&json!({"html_report": "<html>report</html>"})),
            &options,
        );
        assert_eq!(embedded_of(&sections), None);
    }

    #[test]
    fn test_legacy_html_key_is_used() {
        let sections = render(
            Some(&json!({"html": "<!DOCTYPE html><html>legacy</html>"})),
            &RenderOptions::default(),
        );
        assert_eq!(
            embedded_of(&sections),
            Some("<!DOCTYPE html><html>legacy</html>")
        );
    }

    #[test]
    fn test_empty_html_report_without_legacy_key_is_skipped() {
        let sections = render(Some(&json!({"html_report": ""})), &RenderOptions::default());
        assert_eq!(embedded_of(&sections), None);
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn test_non_html_report_is_skipped_silently() {
        let sections = render(
            Some(&json!({"html_report": "Workflow error: node failed"})),
            &RenderOptions::default(),
        );
        assert_eq!(embedded_of(&sections), None);
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn test_marker_check_can_be_relaxed() {
        let options = RenderOptions {
            require_html_marker: false,
            ..RenderOptions::default()
        };
        let sections = render(Some(&json!({"html_report": "<div>x</div>"})), &options);
        assert_eq!(embedded_of(&sections), Some("<div>x</div>"));
    }

    #[test]
    fn test_table_can_be_disabled() {
        let options = RenderOptions {
            show_table: false,
            ..RenderOptions::default()
        };
        let sections = render(Some(&json!({"items": [{"urgency": "P0"}]})), &options);
        assert!(!sections.iter().any(|s| matches!(s, Section::Table(_))));
    }
}
