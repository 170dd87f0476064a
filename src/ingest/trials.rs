// Trial log reader
//
// One row per trial: participant id, raw feedback-mode label, outcome and
// the end-effector gap to the wall in meters. Column names are configurable.

use crate::ingest::{open, parse_number, IngestError, Result};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Names of the required trial columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialColumns {
    pub participant: String,
    pub mode: String,
    pub failure: String,
    pub gap_to_wall: String,
}

impl Default for TrialColumns {
    fn default() -> Self {
        Self {
            participant: "participant".to_string(),
            mode: "mode".to_string(),
            failure: "failure".to_string(),
            gap_to_wall: "gap_to_wall".to_string(),
        }
    }
}

/// Trial outcome parsed from the failure column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// "yes": the end effector touched the wall
    Failure,
    /// "no"
    Success,
    /// Anything else; not a collision, and not credited to safe distance or precision@δ
    Unknown,
}

impl Outcome {
    /// Parse a failure flag (trimmed, case-insensitive)
    pub fn parse(field: &str) -> Self {
        match field.trim().to_lowercase().as_str() {
            "yes" => Outcome::Failure,
            "no" => Outcome::Success,
            _ => Outcome::Unknown,
        }
    }
}

/// A single trial row
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub participant: String,
    /// Raw, un-normalized mode label
    pub mode: String,
    pub outcome: Outcome,
    pub gap_to_wall: Option<f64>,
}

impl TrialRecord {
    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| IngestError::MissingColumn {
            column: name.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })
}

/// Parse trial rows from any reader
///
/// # Example
/// ```
/// use feedback_stats::ingest::{parse_trials, Outcome, TrialColumns};
///
/// let csv = "participant,mode,failure,gap_to_wall\nP1,Audio,no,0.031\nP1,Audio,YES,\n";
/// let trials = parse_trials(csv.as_bytes(), &TrialColumns::default()).unwrap();
/// assert_eq!(trials.len(), 2);
/// assert_eq!(trials[1].outcome, Outcome::Failure);
/// assert_eq!(trials[1].gap_to_wall, None);
/// ```
pub fn parse_trials<R: Read>(reader: R, columns: &TrialColumns) -> Result<Vec<TrialRecord>> {
    let mut reader = ReaderBuilder::new().from_reader(reader);
    let headers = reader.headers()?.clone();

    let participant = column_index(&headers, &columns.participant)?;
    let mode = column_index(&headers, &columns.mode)?;
    let failure = column_index(&headers, &columns.failure)?;
    let gap = column_index(&headers, &columns.gap_to_wall)?;

    let mut trials = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or("");
        trials.push(TrialRecord {
            participant: field(participant).trim().to_string(),
            mode: field(mode).to_string(),
            outcome: Outcome::parse(field(failure)),
            gap_to_wall: parse_number(field(gap)),
        });
    }

    tracing::debug!(rows = trials.len(), "parsed trial log");
    Ok(trials)
}

/// Read the trial log at `path`; a log without data rows is an error
pub fn read_trials(path: &Path, columns: &TrialColumns) -> Result<Vec<TrialRecord>> {
    let trials = parse_trials(open(path)?, columns)?;
    if trials.is_empty() {
        return Err(IngestError::Empty(path.display().to_string()));
    }
    tracing::info!(path = %path.display(), rows = trials.len(), "loaded trials");
    Ok(trials)
}
