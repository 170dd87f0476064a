//! Descriptive statistics with explicit missing values
//!
//! Every helper takes already-filtered values and returns `None` where the
//! statistic is undefined (empty input, too few samples for a sample SD).

use crate::condition::Condition;
use crate::csv_output::{Cell, CsvTable};
use crate::wide::Observation;

/// Arithmetic mean, summed left to right
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (average of the two middle values for even lengths)
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_sd(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|x| (x - m) * (x - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile of sorted data by linear interpolation (Hyndman & Fan type 7)
///
/// `sorted` must be non-empty and ascending; `p` is clamped to [0, 1].
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty(), "quantile of empty slice");
    let p = p.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// A named per-participant-per-condition measure
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMeasure {
    pub name: String,
    pub observations: Vec<Observation>,
}

impl NamedMeasure {
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            name: name.into(),
            observations,
        }
    }

    /// Present values recorded under one condition
    pub fn values_for(&self, condition: Condition) -> Vec<f64> {
        self.observations
            .iter()
            .filter(|o| o.condition.canonical() == Some(condition))
            .filter_map(|o| o.value)
            .collect()
    }
}

/// Mean and sample SD per condition for each measure
///
/// One row per condition in `order`; columns `<measure>_mean`, `<measure>_std`.
pub fn describe(measures: &[NamedMeasure], order: &[Condition]) -> CsvTable {
    let mut header = vec!["condition".to_string()];
    for measure in measures {
        header.push(format!("{}_mean", measure.name));
        header.push(format!("{}_std", measure.name));
    }

    let mut table = CsvTable::new(header);
    for &condition in order {
        let mut row = vec![Cell::Text(condition.to_string())];
        for measure in measures {
            let values = measure.values_for(condition);
            row.push(Cell::Number(mean(&values)));
            row.push(Cell::Number(sample_sd(&values)));
        }
        table.add_row(row);
    }
    table
}
