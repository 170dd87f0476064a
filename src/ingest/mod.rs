//! Input readers for trial logs, questionnaire sheets and exported matrices
//!
//! Any unreadable file, malformed CSV or missing required column is fatal;
//! unparseable numbers inside a readable file become missing values.

mod questionnaire;
mod trials;
mod wide;

pub use questionnaire::{QuestionnaireSheet, DEFAULT_ID_COLUMNS};
pub use trials::{parse_trials, read_trials, Outcome, TrialColumns, TrialRecord};
pub use wide::{parse_wide_matrix, read_wide_matrix};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading input files
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("No data rows in {0}")]
    Empty(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Parse a numeric cell; blank, non-numeric and non-finite text is missing
pub(crate) fn parse_number(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub(crate) fn open(path: &std::path::Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}
