//! Text, Markdown and JSON report generation.
//!
//! Each generator walks the rendered sections in order. The "no findings"
//! indicator is written here when the findings section is empty.

use crate::cli::OutputFormat;
use crate::models::{AnalysisRequest, Finding};
use crate::render::{FindingsTable, Section, SummarySection};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Shown instead of an empty findings list.
pub const NO_FINDINGS: &str = "No risks detected";

/// Widest a text table cell may get before it is cut.
const MAX_CELL_WIDTH: usize = 40;

/// Run details printed alongside the rendered sections.
#[derive(Debug, Clone, Serialize)]
pub struct ReportContext {
    /// Local time the run finished.
    pub run_at: DateTime<Utc>,
    /// The request that produced the response.
    pub request: AnalysisRequest,
    /// Where the embedded HTML report was saved, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_out: Option<PathBuf>,
}

/// Generate a report in the chosen format.
pub fn generate_report(
    format: OutputFormat,
    sections: &[Section],
    context: &ReportContext,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => generate_text_report(sections, context),
        OutputFormat::Markdown => generate_markdown_report(sections, context),
        OutputFormat::Json => generate_json_report(sections, context)?,
    })
}

/// Generate the plain terminal report.
pub fn generate_text_report(sections: &[Section], context: &ReportContext) -> String {
    let mut output = String::new();

    output.push_str("Incident Intel Analysis\n");
    output.push_str("=======================\n\n");

    for section in sections {
        match section {
            Section::Summary(summary) => output.push_str(&text_summary(summary)),
            Section::Findings { findings } => output.push_str(&text_findings(findings)),
            Section::Table(table) => output.push_str(&text_table(table)),
            Section::EmbeddedReport { html } => {
                output.push_str("## HTML Report\n\n");
                output.push_str(&format!("  Embedded report: {} bytes\n", html.len()));
                if let Some(ref path) = context.html_out {
                    output.push_str(&format!("  Saved to: {}\n", path.display()));
                }
                output.push('\n');
            }
        }
    }

    output.push_str(&format!(
        "Audience: {} | Max items: {} | Run at: {}\n",
        context.request.audience,
        context.request.max_items,
        context.run_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}

fn text_summary(summary: &SummarySection) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!("  Generated at: {}\n", summary.generated_at));
    section.push_str(&format!(
        "  Items analyzed: {}\n\n",
        summary.total_items_analyzed
    ));

    section
}

fn text_findings(findings: &[Finding]) -> String {
    let mut section = String::new();

    section.push_str("## Detected Risks\n\n");

    if findings.is_empty() {
        section.push_str(&format!("  {}\n\n", NO_FINDINGS));
        return section;
    }

    for (i, finding) in findings.iter().enumerate() {
        section.push_str(&format!("  Risk #{} - {}\n", i + 1, finding.urgency_label()));
        section.push_str(&format!("    Reason: {}\n", finding.reason));
        section.push_str(&format!("    Services: {}\n", finding.services_display()));
        section.push_str(&format!("    Tags: {}\n", finding.tags_display()));
        section.push_str(&format!(
            "    Recommendation: {}\n\n",
            finding.action_recommendation
        ));
    }

    section
}

fn text_table(table: &FindingsTable) -> String {
    let mut section = String::new();

    section.push_str("## Findings Table\n\n");

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| clip(cell)).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("  {}\n", padded.join(" | ").trim_end())
    };

    section.push_str(&line(table.columns.as_slice()));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    section.push_str(&format!("  {}\n", rule.join("-+-")));
    for row in &rows {
        section.push_str(&line(row.as_slice()));
    }
    section.push('\n');

    section
}

/// Cut a cell to [`MAX_CELL_WIDTH`] characters, on one line.
fn clip(cell: &str) -> String {
    let flat = cell.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_CELL_WIDTH {
        flat
    } else {
        let mut cut: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
        cut.push_str("...");
        cut
    }
}

/// Generate a Markdown report with collapsible findings.
pub fn generate_markdown_report(sections: &[Section], context: &ReportContext) -> String {
    let mut output = String::new();

    output.push_str("# Incident Intel Analysis\n\n");

    for section in sections {
        match section {
            Section::Summary(summary) => {
                output.push_str("## Summary\n\n");
                output.push_str(&format!("- **Generated at:** {}\n", summary.generated_at));
                output.push_str(&format!(
                    "- **Items analyzed:** {}\n\n",
                    summary.total_items_analyzed
                ));
            }
            Section::Findings { findings } => output.push_str(&markdown_findings(findings)),
            Section::Table(table) => output.push_str(&markdown_table(table)),
            Section::EmbeddedReport { html } => {
                output.push_str("## HTML Report\n\n");
                output.push_str("<details>\n<summary>View embedded report</summary>\n\n");
                output.push_str(html);
                output.push_str("\n\n</details>\n\n");
            }
        }
    }

    output.push_str("---\n\n");
    output.push_str(&format!(
        "*Audience: `{}` | Max items: {} | Run at: {}*\n",
        context.request.audience,
        context.request.max_items,
        context.run_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}

fn markdown_findings(findings: &[Finding]) -> String {
    let mut section = String::new();

    section.push_str("## Detected Risks\n\n");

    if findings.is_empty() {
        section.push_str(&format!("{}\n\n", NO_FINDINGS));
        return section;
    }

    for (i, finding) in findings.iter().enumerate() {
        section.push_str(&format!(
            "<details>\n<summary>Risk #{} - {}</summary>\n\n",
            i + 1,
            finding.urgency_label()
        ));
        section.push_str(&format!("**Reason:** {}\n\n", finding.reason));
        section.push_str(&format!("**Services:** {}\n\n", finding.services_display()));
        section.push_str(&format!("**Tags:** {}\n\n", finding.tags_display()));
        section.push_str(&format!(
            "**Recommendation:** {}\n\n",
            finding.action_recommendation
        ));
        section.push_str("</details>\n\n");
    }

    section
}

fn markdown_table(table: &FindingsTable) -> String {
    let escape = |cell: &str| cell.replace('|', "\\|").replace(['\n', '\r'], " ");
    let mut section = String::new();

    section.push_str("## Findings Table\n\n");

    let header: Vec<String> = table.columns.iter().map(|c| escape(c.as_str())).collect();
    section.push_str(&format!("| {} |\n", header.join(" | ")));
    section.push_str(&format!("|{}\n", ":---|".repeat(table.columns.len())));

    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|c| escape(c.as_str())).collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

#[derive(Serialize)]
struct JsonReport<'a> {
    context: &'a ReportContext,
    sections: &'a [Section],
}

/// Generate a JSON report of the rendered sections.
pub fn generate_json_report(sections: &[Section], context: &ReportContext) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport { context, sections }).map_err(Into::into)
}
