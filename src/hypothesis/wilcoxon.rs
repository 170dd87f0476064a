// Wilcoxon signed-rank test for paired samples
//
// Zero differences must already be removed ("wilcox" zero method). The
// statistic is min(R+, R-). Without ties among |d| and for n up to the exact
// threshold, the two-sided p-value comes from the exact null distribution of
// R+ (subset sums of 1..n). Otherwise the normal approximation with the
// tie-corrected variance is used, without continuity correction.

use crate::hypothesis::ranks::{average_ranks, tie_group_sizes};
use anyhow::{Context, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// How the p-value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WilcoxonMethod {
    Exact,
    NormalApprox,
}

/// Result of a Wilcoxon signed-rank test
#[derive(Debug, Clone, PartialEq)]
pub struct WilcoxonTest {
    /// min(R+, R-)
    pub statistic: f64,
    /// Two-sided p-value
    pub pvalue: f64,
    /// Number of non-zero differences ranked
    pub n: usize,
    pub method: WilcoxonMethod,
}

/// Two-sided signed-rank test on non-zero paired differences
///
/// # Example
/// ```
/// use feedback_stats::hypothesis::{wilcoxon_signed_rank, WilcoxonMethod};
///
/// let result = wilcoxon_signed_rank(&[1.0, 2.0, 3.0, 4.0, 5.0], 50).unwrap();
/// assert_eq!(result.statistic, 0.0);
/// assert_eq!(result.method, WilcoxonMethod::Exact);
/// assert!((result.pvalue - 0.0625).abs() < 1e-12);
/// ```
pub fn wilcoxon_signed_rank(differences: &[f64], exact_threshold: usize) -> Result<WilcoxonTest> {
    if differences.iter().any(|&d| d == 0.0) {
        anyhow::bail!("Zero differences must be dropped before the signed-rank test");
    }
    let n = differences.len();
    if n < 2 {
        anyhow::bail!("Signed-rank test needs at least 2 non-zero differences, got {}", n);
    }

    let magnitudes: Vec<f64> = differences.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&magnitudes);

    let r_plus: f64 = differences
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let r_minus: f64 = differences
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d < 0.0)
        .map(|(_, r)| r)
        .sum();
    let statistic = r_plus.min(r_minus);

    let tie_sizes = tie_group_sizes(&magnitudes);
    let has_ties = tie_sizes.iter().any(|&t| t > 1);

    if !has_ties && n <= exact_threshold {
        let pvalue = exact_two_sided(statistic, n);
        return Ok(WilcoxonTest {
            statistic,
            pvalue,
            n,
            method: WilcoxonMethod::Exact,
        });
    }

    let nf = n as f64;
    let mean = nf * (nf + 1.0) / 4.0;
    let tie_adjust: f64 = tie_sizes
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * (t * t - 1.0)
        })
        .sum();
    let variance = (nf * (nf + 1.0) * (2.0 * nf + 1.0) - 0.5 * tie_adjust) / 24.0;
    let z = (statistic - mean) / variance.sqrt();

    let normal = Normal::new(0.0, 1.0).context("Failed to build standard normal")?;
    let pvalue = (2.0 * normal.cdf(-z.abs())).clamp(0.0, 1.0);

    Ok(WilcoxonTest {
        statistic,
        pvalue,
        n,
        method: WilcoxonMethod::NormalApprox,
    })
}

/// Exact two-sided p-value: 2·P(R+ <= t), capped at 1
///
/// R+ under the null is the sum of a uniformly random subset of {1..n};
/// subset counts are accumulated by dynamic programming over the sums.
fn exact_two_sided(statistic: f64, n: usize) -> f64 {
    let max_sum = n * (n + 1) / 2;
    let mut counts = vec![0.0f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for sum in (rank..=max_sum).rev() {
            counts[sum] += counts[sum - rank];
        }
    }

    let t = statistic.floor() as usize;
    let at_or_below: f64 = counts[..=t.min(max_sum)].iter().sum();
    let total = 2f64.powi(n as i32);
    (2.0 * at_or_below / total).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_all_positive() {
        let result = wilcoxon_signed_rank(&[1.0, 2.0, 3.0, 4.0, 5.0], 50).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!((result.pvalue - 2.0 / 32.0).abs() < 1e-12);
        assert_eq!(result.n, 5);
    }

    #[test]
    fn test_exact_one_negative() {
        // R- = 2; subsets of 1..5 summing to <= 2: {}, {1}, {2}
        let result = wilcoxon_signed_rank(&[1.0, -2.0, 3.0, 4.0, 5.0], 50).unwrap();
        assert_eq!(result.statistic, 2.0);
        assert!((result.pvalue - 6.0 / 32.0).abs() < 1e-12);
        assert_eq!(result.method, WilcoxonMethod::Exact);
    }

    #[test]
    fn test_exact_balanced_caps_at_one() {
        let result = wilcoxon_signed_rank(&[1.0, -2.0, -3.0, 4.0], 50).unwrap();
        // R+ = 5, R- = 5: centre of the distribution
        assert_eq!(result.statistic, 5.0);
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn test_exact_two_pairs_minimum_p() {
        let result = wilcoxon_signed_rank(&[0.5, 0.25], 50).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!((result.pvalue - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ties_use_normal_approximation() {
        let diffs = [0.1, 0.1, -0.2, 0.3, 0.4, 0.5];
        let result = wilcoxon_signed_rank(&diffs, 50).unwrap();
        assert_eq!(result.method, WilcoxonMethod::NormalApprox);
        // |d| ranks: 1.5, 1.5, 3, 4, 5, 6 → R- = 3
        assert_eq!(result.statistic, 3.0);
        // mean 10.5; var = (6*7*13 - 0.5*6) / 24 = 22.625
        let z: f64 = (3.0 - 10.5) / 22.625f64.sqrt();
        let expected = 2.0 * Normal::new(0.0, 1.0).unwrap().cdf(-z.abs());
        assert!((result.pvalue - expected).abs() < 1e-12);
    }

    #[test]
    fn test_large_n_uses_normal_approximation() {
        let diffs: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        let result = wilcoxon_signed_rank(&diffs, 10).unwrap();
        assert_eq!(result.method, WilcoxonMethod::NormalApprox);
        assert!(result.pvalue < 0.01);
    }

    #[test]
    fn test_rejects_zero_and_tiny_inputs() {
        assert!(wilcoxon_signed_rank(&[0.0, 1.0, 2.0], 50).is_err());
        assert!(wilcoxon_signed_rank(&[1.0], 50).is_err());
    }
}
