//! CSV output for wide matrices and test results
//!
//! Tables are built from typed cells so the exporter, not the caller,
//! decides how a number or a missing value is rendered. Missing values are
//! always distinguishable from zero: either a blank field or a literal
//! marker such as `N/A`.

use crate::bootstrap::BootstrapEstimate;
use crate::condition::ConditionLabel;
use crate::hypothesis::{OmnibusOutcome, PairwiseResult};
use crate::wide::WideMatrix;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How missing numeric cells are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingStyle {
    /// Empty field
    Blank,
    /// A literal marker (see [`CsvFormat::missing_literal`])
    Literal,
}

/// Number and missing-value rendering options
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFormat {
    /// Fixed decimal places; `None` writes the shortest exact representation
    pub decimals: Option<usize>,
    pub missing: MissingStyle,
    pub missing_literal: String,
}

impl CsvFormat {
    /// Full-precision output with blank missing cells (raw tables)
    pub fn raw() -> Self {
        Self {
            decimals: None,
            missing: MissingStyle::Blank,
            missing_literal: "N/A".to_string(),
        }
    }

    /// Fixed-precision, report-friendly output
    pub fn report(decimals: usize, missing: MissingStyle, missing_literal: impl Into<String>) -> Self {
        Self {
            decimals: Some(decimals),
            missing,
            missing_literal: missing_literal.into(),
        }
    }

    fn format_number(&self, value: Option<f64>) -> String {
        match value {
            Some(v) => match self.decimals {
                Some(d) => format!("{:.*}", d, v),
                None => v.to_string(),
            },
            None => match self.missing {
                MissingStyle::Blank => String::new(),
                MissingStyle::Literal => self.missing_literal.clone(),
            },
        }
    }
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self::report(3, MissingStyle::Blank, "N/A")
    }
}

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(usize),
    Number(Option<f64>),
}

/// Header plus rows of typed cells
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl CsvTable {
    /// Create an empty table with the given header
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Add a row to the table
    pub fn add_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        // If field contains comma, quote, or newline, wrap in quotes and escape quotes
        if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_cell(cell: &Cell, format: &CsvFormat) -> String {
        match cell {
            Cell::Text(s) => Self::escape_field(s),
            Cell::Int(i) => i.to_string(),
            Cell::Number(v) => Self::escape_field(&format.format_number(*v)),
        }
    }

    /// Generate CSV output as string
    pub fn to_csv(&self, format: &CsvFormat) -> String {
        let mut output = String::new();

        let header: Vec<String> = self.header.iter().map(|h| Self::escape_field(h)).collect();
        output.push_str(&header.join(","));
        output.push('\n');

        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(|c| Self::format_cell(c, format)).collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }

        output
    }

    /// Write the table to `path`
    pub fn write_to(&self, path: &Path, format: &CsvFormat) -> Result<()> {
        fs::write(path, self.to_csv(format))
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Wide matrix as a table: `participant` column, then one column per condition
pub fn wide_matrix_table(wide: &WideMatrix) -> CsvTable {
    let mut header = vec!["participant".to_string()];
    header.extend(wide.columns().iter().map(ConditionLabel::to_string));

    let mut table = CsvTable::new(header);
    for (r, participant) in wide.participants().iter().enumerate() {
        let mut row = vec![Cell::Text(participant.clone())];
        row.extend(wide.row(r).iter().map(|v| Cell::Number(*v)));
        table.add_row(row);
    }
    table
}

/// Pairwise results with columns A, B, N_pairs, Zeros_dropped, W, p_raw, p_bonf, p_sign
pub fn pairwise_table(results: &[PairwiseResult]) -> CsvTable {
    let header = ["A", "B", "N_pairs", "Zeros_dropped", "W", "p_raw", "p_bonf", "p_sign"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut table = CsvTable::new(header);
    for r in results {
        table.add_row(vec![
            Cell::Text(r.a.to_string()),
            Cell::Text(r.b.to_string()),
            Cell::Int(r.n_pairs),
            Cell::Int(r.zeros_dropped),
            Cell::Number(r.statistic),
            Cell::Number(r.p_raw),
            Cell::Number(r.p_bonf),
            Cell::Number(r.p_sign),
        ]);
    }
    table
}

/// Text dump of an omnibus result for `friedman_*.txt`
pub fn omnibus_report(measure: &str, outcome: &OmnibusOutcome) -> String {
    outcome.to_report_string(measure)
}

/// Per-condition bootstrap summary: condition, n, mean, ci_low, ci_high
pub fn bootstrap_table(rows: &[(ConditionLabel, usize, BootstrapEstimate)]) -> CsvTable {
    let header = ["condition", "n", "mean", "ci_low", "ci_high"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut table = CsvTable::new(header);
    for (label, n, estimate) in rows {
        let (low, high) = match estimate.interval() {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (None, None),
        };
        table.add_row(vec![
            Cell::Text(label.to_string()),
            Cell::Int(*n),
            Cell::Number(estimate.mean()),
            Cell::Number(low),
            Cell::Number(high),
        ]);
    }
    table
}
