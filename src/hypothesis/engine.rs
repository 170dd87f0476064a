// Repeated-measures test engine
//
// Omnibus: Friedman over the complete submatrix, reported as NotComputed
// (never as a zero statistic) when the minimums are not met.
//
// Pairwise: every unordered column pair in column order. Zero differences
// are dropped and counted; fewer than two non-zero differences fall back to
// the exact sign test. Bonferroni multiplies each raw p-value by the number
// of pairs attempted in this invocation.

use crate::condition::ConditionLabel;
use crate::hypothesis::config::TestConfig;
use crate::hypothesis::friedman::{friedman, FriedmanTest};
use crate::hypothesis::sign_test::{sign_counts, sign_test};
use crate::hypothesis::wilcoxon::{wilcoxon_signed_rank, WilcoxonMethod};
use crate::wide::WideMatrix;
use anyhow::Result;

/// Outcome of the omnibus test
#[derive(Debug, Clone, PartialEq)]
pub enum OmnibusOutcome {
    /// Test was run
    Computed(FriedmanTest),
    /// Complete submatrix too small to test
    NotComputed { complete_rows: usize, columns: usize },
}

impl OmnibusOutcome {
    pub fn test(&self) -> Option<&FriedmanTest> {
        match self {
            OmnibusOutcome::Computed(test) => Some(test),
            OmnibusOutcome::NotComputed { .. } => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, OmnibusOutcome::Computed(_))
    }

    /// Reason the test was skipped, if it was
    pub fn not_computed_reason(&self) -> Option<String> {
        match self {
            OmnibusOutcome::Computed(_) => None,
            OmnibusOutcome::NotComputed {
                complete_rows,
                columns,
            } => Some(format!(
                "complete submatrix has {} row(s) and {} column(s); needs >= 2 rows and >= 3 columns",
                complete_rows, columns
            )),
        }
    }

    /// Text dump of the omnibus result
    pub fn to_report_string(&self, measure: &str) -> String {
        let mut report = String::new();
        report.push_str(&format!("Measure: {}\n", measure));
        report.push_str("Test: Friedman chi-square (repeated measures, complete rows)\n");
        match self {
            OmnibusOutcome::Computed(test) => {
                report.push_str(&format!("statistic={:.6}\n", test.statistic));
                report.push_str(&format!("pvalue={:.6}\n", test.pvalue));
                report.push_str(&format!("df={}\n", test.df));
                report.push_str(&format!("n={}\n", test.n));
                report.push_str(&format!("k={}\n", test.k));
            }
            OmnibusOutcome::NotComputed { .. } => {
                report.push_str("Result: not computed\n");
                if let Some(reason) = self.not_computed_reason() {
                    report.push_str(&format!("Reason: {}\n", reason));
                }
            }
        }
        report
    }
}

/// One row of the pairwise comparison table
///
/// `None` means "not available", never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseResult {
    pub a: ConditionLabel,
    pub b: ConditionLabel,
    /// Rows where both values are present
    pub n_pairs: usize,
    /// Rows whose difference was exactly zero (dropped before testing)
    pub zeros_dropped: usize,
    /// Signed-rank statistic min(R+, R-)
    pub statistic: Option<f64>,
    pub p_raw: Option<f64>,
    pub p_bonf: Option<f64>,
    pub p_sign: Option<f64>,
    /// How `p_raw` was obtained, when it was
    pub method: Option<WilcoxonMethod>,
}

impl PairwiseResult {
    /// Number of non-zero differences that entered the test
    pub fn n_nonzero(&self) -> usize {
        self.n_pairs - self.zeros_dropped
    }

    /// True when the signed-rank test was skipped for the sign-test fallback
    pub fn used_sign_fallback(&self) -> bool {
        self.statistic.is_none()
    }
}

/// Omnibus + pairwise analysis of one measure
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureAnalysis {
    pub omnibus: OmnibusOutcome,
    /// Complete submatrix the tests ran on
    pub complete: WideMatrix,
    pub pairwise: Vec<PairwiseResult>,
}

/// Friedman test on the complete rows of `wide`
pub fn omnibus(wide: &WideMatrix, config: &TestConfig) -> Result<OmnibusOutcome> {
    let complete = wide.complete_rows();
    omnibus_on_complete(&complete, config)
}

fn omnibus_on_complete(complete: &WideMatrix, config: &TestConfig) -> Result<OmnibusOutcome> {
    let rows = complete.n_rows();
    let columns = complete.n_cols();
    if rows < config.min_omnibus_rows || columns < config.min_omnibus_columns {
        tracing::debug!(rows, columns, "omnibus not computed");
        return Ok(OmnibusOutcome::NotComputed {
            complete_rows: rows,
            columns,
        });
    }

    let data: Vec<Vec<f64>> = (0..rows)
        .map(|r| complete.row(r).iter().flatten().copied().collect())
        .collect();
    Ok(OmnibusOutcome::Computed(friedman(&data)?))
}

/// All pairwise signed-rank tests with Bonferroni correction
///
/// Pairs are taken in column order: (0,1), (0,2), ..., (1,2), ...
pub fn pairwise(wide: &WideMatrix, config: &TestConfig) -> Result<Vec<PairwiseResult>> {
    let k = wide.n_cols();
    let mut results = Vec::new();

    for i in 0..k {
        for j in (i + 1)..k {
            results.push(compare_pair(wide, i, j, config)?);
        }
    }

    let m = results.len().max(1) as f64;
    for result in &mut results {
        result.p_bonf = result.p_raw.map(|p| (p * m).min(1.0));
    }
    Ok(results)
}

fn compare_pair(wide: &WideMatrix, i: usize, j: usize, config: &TestConfig) -> Result<PairwiseResult> {
    let a = wide.columns()[i].clone();
    let b = wide.columns()[j].clone();

    let differences: Vec<f64> = (0..wide.n_rows())
        .filter_map(|r| match (wide.get(r, i), wide.get(r, j)) {
            (Some(x), Some(y)) => Some(x - y),
            _ => None,
        })
        .collect();
    let n_pairs = differences.len();

    let nonzero: Vec<f64> = differences.iter().copied().filter(|&d| d != 0.0).collect();
    let zeros_dropped = n_pairs - nonzero.len();
    let (positive, negative) = sign_counts(&nonzero);
    let p_sign = sign_test(positive, negative);

    if nonzero.len() < 2 {
        tracing::debug!(
            a = %a,
            b = %b,
            n_pairs,
            zeros_dropped,
            "too few non-zero differences; sign test only"
        );
        return Ok(PairwiseResult {
            a,
            b,
            n_pairs,
            zeros_dropped,
            statistic: None,
            p_raw: None,
            p_bonf: None,
            p_sign,
            method: None,
        });
    }

    let test = wilcoxon_signed_rank(&nonzero, config.exact_threshold)?;
    Ok(PairwiseResult {
        a,
        b,
        n_pairs,
        zeros_dropped,
        statistic: Some(test.statistic),
        p_raw: Some(test.pvalue),
        p_bonf: None,
        p_sign,
        method: Some(test.method),
    })
}

/// Omnibus and pairwise tests for one wide matrix
///
/// Pairwise tests always run on the complete submatrix, so the omnibus and
/// post-hoc results describe the same participants.
///
/// # Example
/// ```
/// use feedback_stats::condition::Condition;
/// use feedback_stats::hypothesis::{analyze_measure, TestConfig};
/// use feedback_stats::wide::{Observation, WideMatrix};
///
/// let obs = vec![
///     Observation::new("P1", Condition::None, Some(0.5)),
///     Observation::new("P1", Condition::Color, Some(0.0)),
///     Observation::new("P2", Condition::None, Some(0.0)),
///     Observation::new("P2", Condition::Color, Some(0.0)),
/// ];
/// let wide = WideMatrix::from_observations(&obs, &Condition::ALL).unwrap();
/// let analysis = analyze_measure(&wide, &TestConfig::default()).unwrap();
/// assert!(!analysis.omnibus.is_computed());
/// assert_eq!(analysis.pairwise.len(), 1);
/// ```
pub fn analyze_measure(wide: &WideMatrix, config: &TestConfig) -> Result<MeasureAnalysis> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let complete = wide.complete_rows();
    let omnibus = omnibus_on_complete(&complete, config)?;
    let pairwise = pairwise(&complete, config)?;

    Ok(MeasureAnalysis {
        omnibus,
        complete,
        pairwise,
    })
}
