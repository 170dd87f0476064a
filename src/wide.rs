//! Long-to-wide reshaping: participant × condition matrices
//!
//! Records arrive as (participant, condition, value) observations. The wide
//! matrix keys every cell explicitly by (participant, condition) and keeps
//! absent combinations as `None` rather than relying on positional alignment.

use crate::condition::{Condition, ConditionLabel};
use std::collections::HashMap;
use thiserror::Error;

/// A single aggregated value keyed by participant and condition
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub participant: String,
    pub condition: ConditionLabel,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(
        participant: impl Into<String>,
        condition: impl Into<ConditionLabel>,
        value: Option<f64>,
    ) -> Self {
        Self {
            participant: participant.into(),
            condition: condition.into(),
            value,
        }
    }
}

/// Errors raised while reshaping
#[derive(Debug, Error, PartialEq)]
pub enum ReshapeError {
    #[error(
        "Duplicate observation for participant {participant:?}, condition {condition:?}; aggregate before reshaping"
    )]
    DuplicateKey {
        participant: String,
        condition: String,
    },
}

/// Participant (rows) × condition (columns) matrix of optional values
///
/// Invariants: participant rows are unique; canonical columns come first in
/// the configured order, unrecognized labels follow in encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct WideMatrix {
    participants: Vec<String>,
    columns: Vec<ConditionLabel>,
    cells: Vec<Vec<Option<f64>>>,
}

impl WideMatrix {
    /// Build a matrix directly from its parts
    ///
    /// Rows shorter than the column list are padded with `None`.
    pub fn from_parts(
        participants: Vec<String>,
        columns: Vec<ConditionLabel>,
        mut cells: Vec<Vec<Option<f64>>>,
    ) -> Self {
        cells.resize_with(participants.len(), Vec::new);
        for row in &mut cells {
            row.resize(columns.len(), None);
        }
        Self {
            participants,
            columns,
            cells,
        }
    }

    /// Pivot observations into a wide matrix
    ///
    /// Canonical conditions in `order` lead the columns; conditions seen in
    /// the data but absent from `order` are appended in encounter order.
    /// Fails on a duplicate (participant, condition) key.
    ///
    /// # Example
    /// ```
    /// use feedback_stats::condition::Condition;
    /// use feedback_stats::wide::{Observation, WideMatrix};
    ///
    /// let obs = vec![
    ///     Observation::new("P1", Condition::Color, Some(0.0)),
    ///     Observation::new("P1", Condition::None, Some(0.5)),
    ///     Observation::new("P2", Condition::None, Some(0.0)),
    /// ];
    /// let wide = WideMatrix::from_observations(&obs, &Condition::ALL).unwrap();
    /// assert_eq!(wide.n_cols(), 2);
    /// assert_eq!(wide.value("P2", &Condition::Color.into()), None);
    /// ```
    pub fn from_observations(
        observations: &[Observation],
        order: &[Condition],
    ) -> Result<Self, ReshapeError> {
        let mut participants: Vec<String> = Vec::new();
        let mut row_index: HashMap<String, usize> = HashMap::new();
        let mut labels: Vec<ConditionLabel> = Vec::new();
        let mut keyed: HashMap<(usize, usize), Option<f64>> = HashMap::new();

        for obs in observations {
            let row = *row_index
                .entry(obs.participant.clone())
                .or_insert_with(|| {
                    participants.push(obs.participant.clone());
                    participants.len() - 1
                });
            let label = match labels.iter().position(|l| l == &obs.condition) {
                Some(i) => i,
                None => {
                    labels.push(obs.condition.clone());
                    labels.len() - 1
                }
            };
            if keyed.insert((row, label), obs.value).is_some() {
                return Err(ReshapeError::DuplicateKey {
                    participant: obs.participant.clone(),
                    condition: obs.condition.to_string(),
                });
            }
        }

        let mut column_order: Vec<usize> = Vec::with_capacity(labels.len());
        for &condition in order {
            let wanted = ConditionLabel::Canonical(condition);
            if let Some(i) = labels.iter().position(|l| *l == wanted) {
                if !column_order.contains(&i) {
                    column_order.push(i);
                }
            }
        }
        for i in 0..labels.len() {
            if !column_order.contains(&i) {
                column_order.push(i);
            }
        }

        let columns = column_order.iter().map(|&i| labels[i].clone()).collect();
        let cells = (0..participants.len())
            .map(|r| {
                column_order
                    .iter()
                    .map(|&i| keyed.get(&(r, i)).copied().flatten())
                    .collect()
            })
            .collect();

        Ok(Self {
            participants,
            columns,
            cells,
        })
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn columns(&self) -> &[ConditionLabel] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.participants.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty() || self.columns.is_empty()
    }

    /// Cell by position
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn row(&self, row: usize) -> &[Option<f64>] {
        &self.cells[row]
    }

    pub fn column_index(&self, label: &ConditionLabel) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Cell by participant and condition
    pub fn value(&self, participant: &str, label: &ConditionLabel) -> Option<f64> {
        let row = self.participants.iter().position(|p| p == participant)?;
        let col = self.column_index(label)?;
        self.get(row, col)
    }

    /// All cells of one column, missing included
    pub fn column_values(&self, col: usize) -> Vec<Option<f64>> {
        self.cells.iter().map(|row| row[col]).collect()
    }

    /// Non-missing cells of one column
    pub fn column_present(&self, col: usize) -> Vec<f64> {
        self.cells.iter().filter_map(|row| row[col]).collect()
    }

    /// Count of non-missing cells per column
    pub fn non_missing_counts(&self) -> Vec<usize> {
        (0..self.n_cols())
            .map(|col| self.cells.iter().filter(|row| row[col].is_some()).count())
            .collect()
    }

    /// Rows with no missing value in any column (the complete submatrix)
    pub fn complete_rows(&self) -> WideMatrix {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&r| self.cells[r].iter().all(Option::is_some))
            .collect();
        WideMatrix {
            participants: keep.iter().map(|&r| self.participants[r].clone()).collect(),
            columns: self.columns.clone(),
            cells: keep.iter().map(|&r| self.cells[r].clone()).collect(),
        }
    }

    /// Keep only the listed columns that exist, in the listed order
    pub fn restrict_columns(&self, labels: &[ConditionLabel]) -> WideMatrix {
        let indices: Vec<usize> = labels
            .iter()
            .filter_map(|label| self.column_index(label))
            .collect();
        WideMatrix {
            participants: self.participants.clone(),
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            cells: self
                .cells
                .iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
        }
    }

    /// Derive a matrix by transforming every present cell
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> WideMatrix {
        WideMatrix {
            participants: self.participants.clone(),
            columns: self.columns.clone(),
            cells: self
                .cells
                .iter()
                .map(|row| row.iter().map(|cell| cell.map(&f)).collect())
                .collect(),
        }
    }
}
