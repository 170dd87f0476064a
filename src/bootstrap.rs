//! Percentile bootstrap for the mean
//!
//! Resamples the observed values with replacement, takes each resample's
//! mean and reads the confidence bounds off the quantiles of that
//! distribution. The generator is seeded explicitly, so identical input and
//! seed reproduce bit-identical estimates.

use crate::descriptive::{mean, quantile_sorted};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Resampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of bootstrap resamples (default 5000)
    pub resamples: usize,
    /// Two-sided confidence level in (0, 1) (default 0.95)
    pub confidence_level: f64,
    /// Seed for the pseudo-random source
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resamples: 5000,
            confidence_level: 0.95,
            seed: 42,
        }
    }
}

impl BootstrapConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.resamples == 0 {
            return Err("resamples must be >= 1".to_string());
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            ));
        }
        Ok(())
    }
}

/// Bootstrap point estimate and interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BootstrapEstimate {
    Defined { mean: f64, low: f64, high: f64 },
    /// The sample had no present values
    Undefined,
}

impl BootstrapEstimate {
    pub fn mean(&self) -> Option<f64> {
        match *self {
            BootstrapEstimate::Defined { mean, .. } => Some(mean),
            BootstrapEstimate::Undefined => None,
        }
    }

    pub fn interval(&self) -> Option<(f64, f64)> {
        match *self {
            BootstrapEstimate::Defined { low, high, .. } => Some((low, high)),
            BootstrapEstimate::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, BootstrapEstimate::Defined { .. })
    }
}

/// Bootstrap mean and percentile CI, ignoring missing values
///
/// # Example
/// ```
/// use feedback_stats::bootstrap::{bootstrap_mean_ci, BootstrapConfig, BootstrapEstimate};
///
/// let config = BootstrapConfig::default();
/// let sample = [Some(0.5), None, Some(0.0), Some(0.25)];
/// let a = bootstrap_mean_ci(&sample, &config).unwrap();
/// let b = bootstrap_mean_ci(&sample, &config).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(bootstrap_mean_ci(&[None], &config).unwrap(), BootstrapEstimate::Undefined);
/// ```
pub fn bootstrap_mean_ci(sample: &[Option<f64>], config: &BootstrapConfig) -> Result<BootstrapEstimate> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let values: Vec<f64> = sample.iter().flatten().copied().collect();
    let Some(point) = mean(&values) else {
        return Ok(BootstrapEstimate::Undefined);
    };

    let n = values.len();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut boot_means: Vec<f64> = Vec::with_capacity(config.resamples);
    let mut draw: Vec<f64> = vec![0.0; n];

    for _ in 0..config.resamples {
        for slot in draw.iter_mut() {
            *slot = values[rng.gen_range(0..n)];
        }
        // Same summation as the point estimate, so a constant sample gives
        // low == mean == high exactly
        boot_means.push(draw.iter().sum::<f64>() / n as f64);
    }
    boot_means.sort_by(|a, b| a.total_cmp(b));

    let alpha = 1.0 - config.confidence_level;
    let low = quantile_sorted(&boot_means, alpha / 2.0);
    let high = quantile_sorted(&boot_means, 1.0 - alpha / 2.0);

    tracing::trace!(n, resamples = config.resamples, point, low, high, "bootstrap mean CI");

    Ok(BootstrapEstimate::Defined {
        mean: point,
        low,
        high,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Option<f64>> {
        vec![
            Some(0.12),
            Some(0.30),
            None,
            Some(0.18),
            Some(0.25),
            Some(0.05),
            Some(0.40),
        ]
    }

    #[test]
    fn test_default_config() {
        let config = BootstrapConfig::default();
        assert_eq!(config.resamples, 5000);
        assert_eq!(config.confidence_level, 0.95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let zero = BootstrapConfig {
            resamples: 0,
            ..BootstrapConfig::default()
        };
        assert!(zero.validate().is_err());
        assert!(bootstrap_mean_ci(&sample(), &zero).is_err());

        let level = BootstrapConfig {
            confidence_level: 1.0,
            ..BootstrapConfig::default()
        };
        assert!(level.validate().is_err());
    }

    #[test]
    fn test_deterministic_with_seed() {
        let config = BootstrapConfig::default();
        let a = bootstrap_mean_ci(&sample(), &config).unwrap();
        let b = bootstrap_mean_ci(&sample(), &config).unwrap();
        match (a, b) {
            (
                BootstrapEstimate::Defined { mean: m1, low: l1, high: h1 },
                BootstrapEstimate::Defined { mean: m2, low: l2, high: h2 },
            ) => {
                assert_eq!(m1.to_bits(), m2.to_bits());
                assert_eq!(l1.to_bits(), l2.to_bits());
                assert_eq!(h1.to_bits(), h2.to_bits());
            }
            _ => panic!("Expected defined estimates"),
        }
    }

    #[test]
    fn test_interval_brackets_mean() {
        let est = bootstrap_mean_ci(&sample(), &BootstrapConfig::default()).unwrap();
        let m = est.mean().unwrap();
        let (lo, hi) = est.interval().unwrap();
        assert!(lo <= m && m <= hi, "{lo} <= {m} <= {hi}");
        assert!(lo < hi);
        assert!((m - 1.3 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_sample_degenerate_interval() {
        let est = bootstrap_mean_ci(&[Some(0.7); 5], &BootstrapConfig::default()).unwrap();
        let m = est.mean().unwrap();
        assert!((m - 0.7).abs() < 1e-12);
        assert_eq!(est.interval(), Some((m, m)));
    }

    #[test]
    fn test_empty_sample_is_undefined() {
        let config = BootstrapConfig::default();
        let est = bootstrap_mean_ci(&[], &config).unwrap();
        assert_eq!(est, BootstrapEstimate::Undefined);
        assert_eq!(est.mean(), None);
        assert_eq!(est.interval(), None);

        let all_missing = bootstrap_mean_ci(&[None, None], &config).unwrap();
        assert!(!all_missing.is_defined());
    }

    #[test]
    fn test_different_seed_changes_interval() {
        let a = bootstrap_mean_ci(&sample(), &BootstrapConfig::default()).unwrap();
        let b = bootstrap_mean_ci(
            &sample(),
            &BootstrapConfig {
                seed: 7,
                ..BootstrapConfig::default()
            },
        )
        .unwrap();
        assert_eq!(a.mean(), b.mean());
        assert_ne!(a.interval(), b.interval());
    }
}
