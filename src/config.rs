//! Analysis configuration loaded from TOML
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! standard four-condition analysis. CLI flags override individual values.
//!
//! # Example config
//!
//! ```toml
//! [paths]
//! trials = "end_effector_trials.csv"
//! output_root = "results"
//!
//! [analysis]
//! condition_order = ["None", "Color", "Audio", "Gamepad"]
//! precision_deltas = [0.03, 0.04]
//! seed = 42
//!
//! [export]
//! missing_style = "literal"
//! missing_literal = "N/A"
//! decimals = 3
//! ```

use crate::bootstrap::BootstrapConfig;
use crate::condition::Condition;
use crate::csv_output::{CsvFormat, MissingStyle};
use crate::hypothesis::TestConfig;
use crate::ingest::TrialColumns;
use crate::subjective::QuestionnaireLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Trial log CSV (objective analysis)
    pub trials: Option<PathBuf>,
    /// Questionnaire CSV (subjective analysis)
    pub questionnaire: Option<PathBuf>,
    /// Parent directory of the timestamped run directories
    pub output_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            trials: None,
            questionnaire: None,
            output_root: PathBuf::from("results"),
        }
    }
}

/// Statistical parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Canonical column order of every matrix
    pub condition_order: Vec<Condition>,
    /// Precision@δ thresholds in meters
    pub precision_deltas: Vec<f64>,
    /// Seed for the bootstrap and the plot jitter
    pub seed: u64,
    pub bootstrap_resamples: usize,
    pub confidence_level: f64,
    /// Largest n for the exact signed-rank distribution
    pub exact_threshold: usize,
    /// Also render the supplementary heatmaps
    pub all_figures: bool,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        let bootstrap = BootstrapConfig::default();
        Self {
            condition_order: Condition::ALL.to_vec(),
            precision_deltas: vec![0.03, 0.04],
            seed: bootstrap.seed,
            bootstrap_resamples: bootstrap.resamples,
            confidence_level: bootstrap.confidence_level,
            exact_threshold: TestConfig::default().exact_threshold,
            all_figures: false,
        }
    }
}

/// Report-friendly number formatting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub missing_style: MissingStyle,
    pub missing_literal: String,
    pub decimals: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            missing_style: MissingStyle::Blank,
            missing_literal: "N/A".to_string(),
            decimals: 3,
        }
    }
}

/// Input file layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InputsConfig {
    pub trial_columns: TrialColumns,
    pub questionnaire: QuestionnaireLayout,
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub paths: PathsConfig,
    pub analysis: AnalysisSection,
    pub export: ExportConfig,
    pub inputs: InputsConfig,
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let order = &self.analysis.condition_order;
        if order.is_empty() {
            return Err(ConfigError::Invalid(
                "condition_order must not be empty".to_string(),
            ));
        }
        for (i, c) in order.iter().enumerate() {
            if order[i + 1..].contains(c) {
                return Err(ConfigError::Invalid(format!(
                    "condition {} listed twice in condition_order",
                    c
                )));
            }
        }

        if let Some(d) = self
            .analysis
            .precision_deltas
            .iter()
            .find(|d| !(d.is_finite() && **d > 0.0))
        {
            return Err(ConfigError::Invalid(format!(
                "precision_deltas must be positive, got {}",
                d
            )));
        }

        if self.export.decimals > 12 {
            return Err(ConfigError::Invalid(format!(
                "decimals must be <= 12, got {}",
                self.export.decimals
            )));
        }

        self.bootstrap_config()
            .validate()
            .map_err(ConfigError::Invalid)?;
        self.test_config().validate().map_err(ConfigError::Invalid)?;
        self.inputs
            .questionnaire
            .validate()
            .map_err(ConfigError::Invalid)?;

        Ok(())
    }

    pub fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            resamples: self.analysis.bootstrap_resamples,
            confidence_level: self.analysis.confidence_level,
            seed: self.analysis.seed,
        }
    }

    pub fn test_config(&self) -> TestConfig {
        TestConfig {
            exact_threshold: self.analysis.exact_threshold,
            ..TestConfig::default()
        }
    }

    /// Format for report-friendly tables
    pub fn csv_format(&self) -> CsvFormat {
        CsvFormat::report(
            self.export.decimals,
            self.export.missing_style,
            self.export.missing_literal.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.condition_order, Condition::ALL.to_vec());
        assert_eq!(config.analysis.precision_deltas, vec![0.03, 0.04]);
        assert_eq!(config.bootstrap_config(), BootstrapConfig::default());
        assert_eq!(config.test_config(), TestConfig::default());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
            [paths]
            trials = "trials.csv"

            [analysis]
            condition_order = ["Color", "Audio", "Gamepad"]
            seed = 7

            [export]
            missing_style = "literal"
            decimals = 2

            [inputs.trial_columns]
            gap_to_wall = "gap"

            [[inputs.questionnaire.suffixes]]
            suffix = "_a"
            condition = "Color"
        "#;
        let config = AnalysisConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.paths.trials, Some(PathBuf::from("trials.csv")));
        assert_eq!(config.paths.output_root, PathBuf::from("results"));
        assert_eq!(config.analysis.condition_order.len(), 3);
        assert_eq!(config.analysis.seed, 7);
        assert_eq!(config.analysis.bootstrap_resamples, 5000);
        assert_eq!(config.inputs.trial_columns.gap_to_wall, "gap");
        assert_eq!(config.inputs.trial_columns.participant, "participant");
        assert_eq!(config.inputs.questionnaire.suffixes.len(), 1);
        assert_eq!(config.inputs.questionnaire.ssq_subscales.len(), 3);

        let format = config.csv_format();
        assert_eq!(format.decimals, Some(2));
        assert_eq!(format.missing, MissingStyle::Literal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_condition_is_parse_error() {
        let err = AnalysisConfig::from_toml_str("[analysis]\ncondition_order = [\"Thermal\"]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = AnalysisConfig::default();
        config.analysis.condition_order = vec![Condition::None, Condition::None];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AnalysisConfig::default();
        config.analysis.precision_deltas = vec![0.03, -1.0];
        assert!(config.validate().unwrap_err().to_string().contains("precision_deltas"));

        let mut config = AnalysisConfig::default();
        config.analysis.confidence_level = 1.5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.analysis.bootstrap_resamples = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = AnalysisConfig::from_file("/nonexistent/feedback-stats.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = AnalysisConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(AnalysisConfig::from_toml_str(&text).unwrap(), config);
    }
}
