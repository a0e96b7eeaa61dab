//! Tabular projection of findings and its CSV export.

use crate::models::{display_cell, Finding};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Findings laid out as rows under a shared set of columns.
///
/// Columns are the union of keys across all records, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingsTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FindingsTable {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for finding in findings {
            for key in finding.fields.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = findings
            .iter()
            .map(|finding| {
                columns
                    .iter()
                    .map(|column| {
                        finding
                            .fields
                            .get(column)
                            .map(display_cell)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Write the table as CSV, header row first.
pub fn write_csv(table: &FindingsTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    Ok(())
}
