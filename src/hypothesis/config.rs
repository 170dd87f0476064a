// Configuration for the repeated-measures test engine

use serde::{Deserialize, Serialize};

/// Configuration for omnibus and pairwise testing
///
/// # Example
/// ```
/// use feedback_stats::hypothesis::TestConfig;
///
/// let config = TestConfig::default();
/// assert_eq!(config.exact_threshold, 50);
/// assert_eq!(config.min_omnibus_rows, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestConfig {
    /// Largest number of non-zero differences for which the exact signed-rank
    /// distribution is used (ties always fall back to the normal approximation)
    ///
    /// Default: 50
    pub exact_threshold: usize,

    /// Minimum complete rows for the omnibus test
    ///
    /// Default: 2
    pub min_omnibus_rows: usize,

    /// Minimum columns (conditions) for the omnibus test
    ///
    /// Default: 3
    pub min_omnibus_columns: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            exact_threshold: 50,
            min_omnibus_rows: 2,
            min_omnibus_columns: 3,
        }
    }
}

impl TestConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.exact_threshold > 1000 {
            return Err(format!(
                "exact_threshold must be <= 1000, got {}",
                self.exact_threshold
            ));
        }

        if self.min_omnibus_rows < 2 {
            return Err(format!(
                "min_omnibus_rows must be >= 2, got {}",
                self.min_omnibus_rows
            ));
        }

        if self.min_omnibus_columns < 3 {
            return Err(format!(
                "min_omnibus_columns must be >= 3 for the Friedman test, got {}",
                self.min_omnibus_columns
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TestConfig::default();
        assert_eq!(config.exact_threshold, 50);
        assert_eq!(config.min_omnibus_rows, 2);
        assert_eq!(config.min_omnibus_columns, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_min_rows() {
        let mut config = TestConfig::default();
        config.min_omnibus_rows = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_min_columns() {
        let mut config = TestConfig::default();
        config.min_omnibus_columns = 2;
        assert!(config.validate().is_err());
    }
}
