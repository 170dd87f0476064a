//! CLI argument parsing for feedback-stats

use crate::config::AnalysisConfig;
use crate::csv_output::MissingStyle;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which analysis to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Analysis {
    /// Trial log: collision rate, safe distance, precision@δ
    Objective,
    /// Questionnaire: NASA-TLX, SSQ, helpfulness
    Subjective,
    /// Every analysis whose input is configured (default)
    All,
}

#[derive(Parser, Debug)]
#[command(name = "feedback-stats")]
#[command(version)]
#[command(about = "Repeated-measures statistics for a four-condition feedback study", long_about = None)]
pub struct Cli {
    /// Analysis to run
    #[arg(value_enum, default_value = "all")]
    pub analysis: Analysis,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Trial log CSV (overrides [paths].trials)
    #[arg(short, long, value_name = "CSV")]
    pub trials: Option<PathBuf>,

    /// Questionnaire CSV (overrides [paths].questionnaire)
    #[arg(short, long, value_name = "CSV")]
    pub questionnaire: Option<PathBuf>,

    /// Parent directory for timestamped run directories
    #[arg(short, long = "output-root", value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Seed for bootstrap resampling and plot jitter
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Number of bootstrap resamples
    #[arg(long, value_name = "N")]
    pub resamples: Option<usize>,

    /// Precision@δ thresholds in meters (comma-separated)
    #[arg(long = "precision-deltas", value_name = "METERS", value_delimiter = ',')]
    pub precision_deltas: Vec<f64>,

    /// How missing cells are written (overrides [export].missing_style)
    #[arg(long = "missing-style", value_enum, value_name = "STYLE")]
    pub missing_style: Option<MissingStyle>,

    /// Literal for missing cells; implies --missing-style literal unless given
    #[arg(long = "na-literal", value_name = "TEXT")]
    pub na_literal: Option<String>,

    /// Decimal places in report-friendly tables
    #[arg(long, value_name = "N")]
    pub decimals: Option<usize>,

    /// Also render the supplementary heatmaps
    #[arg(long = "all-figures")]
    pub all_figures: bool,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Load the config file (or defaults), apply flag overrides and validate
    pub fn load_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(path) = &self.trials {
            config.paths.trials = Some(path.clone());
        }
        if let Some(path) = &self.questionnaire {
            config.paths.questionnaire = Some(path.clone());
        }
        if let Some(root) = &self.output_root {
            config.paths.output_root = root.clone();
        }
        if let Some(seed) = self.seed {
            config.analysis.seed = seed;
        }
        if let Some(resamples) = self.resamples {
            config.analysis.bootstrap_resamples = resamples;
        }
        if !self.precision_deltas.is_empty() {
            config.analysis.precision_deltas = self.precision_deltas.clone();
        }
        if let Some(literal) = &self.na_literal {
            config.export.missing_style = MissingStyle::Literal;
            config.export.missing_literal = literal.clone();
        }
        if let Some(style) = self.missing_style {
            config.export.missing_style = style;
        }
        if let Some(decimals) = self.decimals {
            config.export.decimals = decimals;
        }
        if self.all_figures {
            config.analysis.all_figures = true;
        }
    }
}
