// Friedman rank test for k related samples
//
// Each row (participant) is ranked across the k conditions; the statistic
// compares the column rank sums against their expectation under the null of
// exchangeable conditions. Ties within a row use mid-ranks and the statistic
// is divided by the usual tie correction. The p-value is the upper tail of a
// chi-square distribution with k - 1 degrees of freedom.

use crate::hypothesis::ranks::{average_ranks, tie_term};
use anyhow::{Context, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Result of a Friedman test
#[derive(Debug, Clone, PartialEq)]
pub struct FriedmanTest {
    /// Tie-corrected chi-square statistic
    pub statistic: f64,
    /// Upper-tail p-value
    pub pvalue: f64,
    /// Degrees of freedom (k - 1)
    pub df: usize,
    /// Number of blocks (complete rows)
    pub n: usize,
    /// Number of treatments (columns)
    pub k: usize,
}

/// Run the Friedman test on complete rows
///
/// Every row must have the same length `k >= 3`, and there must be at least
/// two rows. When every row is fully tied the statistic is 0 with p = 1.
///
/// # Example
/// ```
/// use feedback_stats::hypothesis::friedman;
///
/// let rows = vec![vec![1.0, 2.0, 3.0], vec![1.0, 3.0, 2.0], vec![1.0, 2.0, 3.0]];
/// let result = friedman(&rows).unwrap();
/// assert_eq!(result.df, 2);
/// assert!(result.statistic > 0.0);
/// ```
pub fn friedman(rows: &[Vec<f64>]) -> Result<FriedmanTest> {
    let n = rows.len();
    if n < 2 {
        anyhow::bail!("Friedman test needs at least 2 rows, got {}", n);
    }
    let k = rows[0].len();
    if k < 3 {
        anyhow::bail!("Friedman test needs at least 3 columns, got {}", k);
    }
    if rows.iter().any(|row| row.len() != k) {
        anyhow::bail!("Friedman test rows must all have {} columns", k);
    }

    let nf = n as f64;
    let kf = k as f64;

    let mut rank_sums = vec![0.0; k];
    let mut ties = 0.0;
    for row in rows {
        for (sum, rank) in rank_sums.iter_mut().zip(average_ranks(row)) {
            *sum += rank;
        }
        ties += tie_term(row);
    }

    let ss_ranks: f64 = rank_sums.iter().map(|r| r * r).sum();
    let correction = 1.0 - ties / (nf * kf * (kf * kf - 1.0));
    let df = k - 1;

    if correction <= f64::EPSILON {
        // Every row fully tied: no evidence of any difference
        return Ok(FriedmanTest {
            statistic: 0.0,
            pvalue: 1.0,
            df,
            n,
            k,
        });
    }

    let raw = 12.0 / (nf * kf * (kf + 1.0)) * ss_ranks - 3.0 * nf * (kf + 1.0);
    // Guard against -0.0 / tiny negative rounding when rank sums are equal
    let statistic = (raw / correction).max(0.0);

    let chi2 = ChiSquared::new(df as f64).context("Failed to build chi-square distribution")?;
    let pvalue = chi2.sf(statistic).clamp(0.0, 1.0);

    Ok(FriedmanTest {
        statistic,
        pvalue,
        df,
        n,
        k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friedman_reference_dataset() {
        // Three treatments measured on seven subjects; reference
        // statistic 10.5714..., p = 0.0050634...
        let a = [72.0, 96.0, 88.0, 92.0, 74.0, 76.0, 82.0];
        let b = [120.0, 120.0, 132.0, 120.0, 101.0, 96.0, 112.0];
        let c = [76.0, 95.0, 104.0, 96.0, 84.0, 72.0, 76.0];
        let rows: Vec<Vec<f64>> = (0..7).map(|i| vec![a[i], b[i], c[i]]).collect();

        let result = friedman(&rows).unwrap();
        assert!((result.statistic - 74.0 / 7.0).abs() < 1e-9);
        assert!((result.pvalue - 0.005_063_414_171_757_498).abs() < 1e-9);
        assert_eq!(result.df, 2);
        assert_eq!(result.n, 7);
        assert_eq!(result.k, 3);
    }

    #[test]
    fn test_friedman_identical_columns() {
        let rows = vec![vec![0.0, 0.0, 0.0], vec![0.2, 0.2, 0.2], vec![1.0, 1.0, 1.0]];
        let result = friedman(&rows).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn test_friedman_with_partial_ties() {
        // Row 1 has a tie; correction must stay finite and positive
        let rows = vec![vec![0.5, 0.0, 0.0], vec![0.0, 0.0, 0.0], vec![0.3, 0.1, 0.2]];
        let result = friedman(&rows).unwrap();
        assert!(result.statistic.is_finite());
        assert!(result.statistic > 0.0);
        assert!(result.pvalue > 0.0 && result.pvalue <= 1.0);
    }

    #[test]
    fn test_friedman_requires_minimums() {
        assert!(friedman(&[vec![1.0, 2.0, 3.0]]).is_err());
        assert!(friedman(&[vec![1.0, 2.0], vec![2.0, 1.0]]).is_err());
        assert!(friedman(&[vec![1.0, 2.0, 3.0], vec![2.0, 1.0]]).is_err());
    }
}
