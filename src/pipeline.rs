//! Batch driver: read inputs, compute measures, write every table and figure
//!
//! Each run writes into its own timestamped directory and returns a
//! [`RunSummary`] naming the files written and every statistic that could
//! not be computed. Figure failures are logged and recorded, never fatal.

use crate::bootstrap::{bootstrap_mean_ci, BootstrapConfig, BootstrapEstimate};
use crate::condition::{Condition, ConditionLabel};
use crate::config::AnalysisConfig;
use crate::csv_output::{bootstrap_table, omnibus_report, pairwise_table, wide_matrix_table, CsvFormat, CsvTable};
use crate::descriptive::{describe, mean, sample_sd, NamedMeasure};
use crate::hypothesis::{analyze_measure, MeasureAnalysis};
use crate::ingest::{read_trials, QuestionnaireSheet};
use crate::objective::compute_measures;
use crate::plot::{self, PlotResult};
use crate::subjective::{extract, HELP_CONDITIONS};
use crate::wide::WideMatrix;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Timestamp format of run directory names
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A created output directory `<root>/<prefix>_<YYYYmmdd_HHMMSS>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    path: PathBuf,
}

impl RunDirectory {
    /// Create a fresh directory under `root`, creating `root` if needed
    ///
    /// An existing directory is never reused: a second run in the same
    /// second gets `<prefix>_<stamp>_2`, then `_3` and so on.
    pub fn create(root: &Path, prefix: &str, timestamp: NaiveDateTime) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create output root {}", root.display()))?;
        let name = format!("{}_{}", prefix, timestamp.format(STAMP_FORMAT));
        let mut attempt = 1u32;
        loop {
            let path = if attempt == 1 {
                root.join(&name)
            } else {
                root.join(format!("{}_{}", name, attempt))
            };
            match fs::create_dir(&path) {
                Ok(()) => return Ok(Self { path }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %path.display(), "run directory exists, trying next suffix");
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to create output directory {}", path.display()))
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, file: &str) -> PathBuf {
        self.path.join(file)
    }
}

/// A statistic that could not be computed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotComputed {
    pub measure: String,
    pub statistic: String,
    pub reason: String,
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub files: Vec<String>,
    pub not_computed: Vec<NotComputed>,
    pub unrecognized_labels: Vec<String>,
    pub failed_figures: Vec<String>,
}

impl RunSummary {
    fn new(dir: &RunDirectory) -> Self {
        Self {
            output_dir: dir.path().to_path_buf(),
            files: Vec::new(),
            not_computed: Vec::new(),
            unrecognized_labels: Vec::new(),
            failed_figures: Vec::new(),
        }
    }

    fn note(&mut self, measure: &str, statistic: impl Into<String>, reason: impl Into<String>) {
        self.not_computed.push(NotComputed {
            measure: measure.to_string(),
            statistic: statistic.into(),
            reason: reason.into(),
        });
    }

    /// Human-readable summary for stdout
    pub fn to_text(&self) -> String {
        let mut out = format!("Output dir: {}\n", self.output_dir.display());
        out.push_str(&format!("Files written: {}\n", self.files.len()));
        for note in &self.not_computed {
            out.push_str(&format!(
                "not computed: {} / {}: {}\n",
                note.measure, note.statistic, note.reason
            ));
        }
        if !self.unrecognized_labels.is_empty() {
            out.push_str(&format!(
                "unrecognized condition labels: {}\n",
                self.unrecognized_labels.join(", ")
            ));
        }
        for figure in &self.failed_figures {
            out.push_str(&format!("figure not rendered: {}\n", figure));
        }
        out
    }
}

/// Writes files into a run directory and records them in the summary
struct RunWriter<'a> {
    dir: &'a RunDirectory,
    summary: RunSummary,
}

impl<'a> RunWriter<'a> {
    fn new(dir: &'a RunDirectory) -> Self {
        Self {
            dir,
            summary: RunSummary::new(dir),
        }
    }

    fn table(&mut self, name: &str, table: &CsvTable, format: &CsvFormat) -> Result<()> {
        table.write_to(&self.dir.join(name), format)?;
        tracing::debug!(file = name, rows = table.rows().len(), "wrote table");
        self.summary.files.push(name.to_string());
        Ok(())
    }

    fn text(&mut self, name: &str, content: &str) -> Result<()> {
        let path = self.dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        self.summary.files.push(name.to_string());
        Ok(())
    }

    fn figure(&mut self, name: &str, render: impl FnOnce(&Path) -> PlotResult) {
        match render(&self.dir.join(name)) {
            Ok(()) => self.summary.files.push(name.to_string()),
            Err(e) => {
                tracing::warn!(figure = name, "Failed to render figure: {}", e);
                self.summary.failed_figures.push(name.to_string());
            }
        }
    }

    /// Omnibus dump, pairwise table and not-computed notes for one measure
    fn test_results(
        &mut self,
        measure: &str,
        analysis: &MeasureAnalysis,
        omnibus_file: &str,
        pairwise_file: &str,
        format: &CsvFormat,
    ) -> Result<()> {
        self.text(omnibus_file, &omnibus_report(measure, &analysis.omnibus))?;
        if let Some(reason) = analysis.omnibus.not_computed_reason() {
            self.summary.note(measure, "Friedman", reason);
        }

        self.table(pairwise_file, &pairwise_table(&analysis.pairwise), format)?;
        for pair in analysis.pairwise.iter().filter(|p| p.p_raw.is_none()) {
            self.summary.note(
                measure,
                format!("Wilcoxon {} vs {}", pair.a, pair.b),
                format!(
                    "{} non-zero difference(s) out of {} pair(s); sign test only",
                    pair.n_nonzero(),
                    pair.n_pairs
                ),
            );
        }
        Ok(())
    }

    /// Per-column bootstrap summary; returns the estimates in column order
    fn bootstrap(
        &mut self,
        measure: &str,
        wide: &WideMatrix,
        config: &BootstrapConfig,
        format: &CsvFormat,
    ) -> Result<Vec<BootstrapEstimate>> {
        let mut rows = Vec::with_capacity(wide.n_cols());
        for (col, label) in wide.columns().iter().enumerate() {
            let values = wide.column_values(col);
            let n = values.iter().flatten().count();
            let estimate = bootstrap_mean_ci(&values, config)
                .with_context(|| format!("Bootstrap failed for {} / {}", measure, label))?;
            if !estimate.is_defined() {
                self.summary
                    .note(measure, format!("bootstrap CI {}", label), "no observations");
            }
            rows.push((label.clone(), n, estimate));
        }
        self.table(&format!("bootstrap_{}.csv", measure), &bootstrap_table(&rows), format)?;
        Ok(rows.into_iter().map(|(_, _, e)| e).collect())
    }

    fn finish(mut self) -> Result<RunSummary> {
        let name = "summary.json";
        self.summary.files.push(name.to_string());
        let json = serde_json::to_string_pretty(&self.summary).context("Failed to serialize run summary")?;
        let path = self.dir.join(name);
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(self.summary)
    }
}

/// Full-precision numbers with the configured missing marker
fn stats_format(config: &AnalysisConfig) -> CsvFormat {
    CsvFormat {
        decimals: None,
        ..config.csv_format()
    }
}

/// Objective analysis of the trial log at `trials_path`
pub fn run_objective(config: &AnalysisConfig, trials_path: &Path, dir: &RunDirectory) -> Result<RunSummary> {
    let order = &config.analysis.condition_order;
    let seed = config.analysis.seed;
    let raw = CsvFormat::raw();
    let report = config.csv_format();
    let stats = stats_format(config);
    let tests = config.test_config();
    let boot = config.bootstrap_config();

    let trials = read_trials(trials_path, &config.inputs.trial_columns)
        .with_context(|| format!("Failed to load trials from {}", trials_path.display()))?;
    let measures = compute_measures(&trials, order, &config.analysis.precision_deltas)?;

    let mut out = RunWriter::new(dir);
    out.summary.unrecognized_labels = measures.unrecognized.clone();

    out.table(
        "collision_rate_per_participant.csv",
        &wide_matrix_table(&measures.collision),
        &raw,
    )?;
    out.table(
        "success_rate_per_participant.csv",
        &wide_matrix_table(&measures.success),
        &raw,
    )?;
    out.table(
        "median_safe_distance_per_participant_raw.csv",
        &wide_matrix_table(&measures.safe_distance),
        &raw,
    )?;
    out.table(
        "median_safe_distance_per_participant.csv",
        &wide_matrix_table(&measures.safe_distance),
        &report,
    )?;
    for p in &measures.precision_at {
        out.table(
            &format!("{}_per_participant.csv", p.name()),
            &wide_matrix_table(&p.wide),
            &raw,
        )?;
    }

    let collision = analyze_measure(&measures.collision, &tests)?;
    out.test_results(
        "collision_rate",
        &collision,
        "friedman_collision.txt",
        "pairwise_wilcoxon_collisions.csv",
        &stats,
    )?;
    let precision = analyze_measure(&measures.safe_distance, &tests)?;
    out.test_results(
        "median_safe_distance",
        &precision,
        "friedman_precision.txt",
        "pairwise_wilcoxon_precision.csv",
        &stats,
    )?;

    let collision_ci = out.bootstrap("collision_rate", &measures.collision, &boot, &stats)?;
    out.bootstrap("success_rate", &measures.success, &boot, &stats)?;
    out.bootstrap("median_safe_distance", &measures.safe_distance, &boot, &stats)?;
    let mut precision_ci = Vec::with_capacity(measures.precision_at.len());
    for p in &measures.precision_at {
        precision_ci.push(out.bootstrap(&p.name(), &p.wide, &boot, &stats)?);
    }

    let n = measures.collision.n_rows();
    out.figure("collision_rate_mean_ci_swarm.svg", |path| {
        plot::dot_ci_swarm(
            path,
            &measures.collision,
            &collision_ci,
            &format!("Collision rate by condition (mean ±95% CI; N={})", n),
            "Collision rate (0..1)",
            seed,
        )
    });
    for (p, ci) in measures.precision_at.iter().zip(&precision_ci) {
        out.figure(&format!("precision_at_{}cm_mean_ci_swarm.svg", p.centimeters()), |path| {
            plot::dot_ci_swarm(
                path,
                &p.wide,
                ci,
                &format!("Precision @ ≤{} cm (mean ±95% CI)", p.centimeters()),
                "Rate (0..1)",
                seed,
            )
        });
    }
    out.figure("safe_distance_box_scatter.svg", |path| {
        plot::box_scatter(
            path,
            &measures.safe_distance,
            "Median safe distance by condition (successful trials only)",
            "Median safe distance (m)",
            seed,
        )
    });

    if config.analysis.all_figures {
        out.figure("collision_rate_heatmap.svg", |path| {
            plot::heatmap01(path, &measures.collision, "Collision rate (heatmap)")
        });
        for p in &measures.precision_at {
            out.figure(&format!("precision_at_{}cm_heatmap.svg", p.centimeters()), |path| {
                plot::heatmap01(
                    path,
                    &p.wide,
                    &format!("Precision @ ≤{} cm (heatmap)", p.centimeters()),
                )
            });
        }
    }

    tracing::info!(dir = %dir.path().display(), "objective analysis complete");
    out.finish()
}

/// Wide matrix of one subjective measure, restricted to `order`
fn measure_matrix(measure: &NamedMeasure, order: &[Condition]) -> Result<WideMatrix> {
    let wide = WideMatrix::from_observations(&measure.observations, order)
        .with_context(|| format!("Failed to reshape {}", measure.name))?;
    let labels: Vec<ConditionLabel> = order.iter().map(|&c| c.into()).collect();
    Ok(wide.restrict_columns(&labels))
}

/// Subjective analysis of the questionnaire at `questionnaire_path`
pub fn run_subjective(
    config: &AnalysisConfig,
    questionnaire_path: &Path,
    dir: &RunDirectory,
) -> Result<RunSummary> {
    let order = &config.analysis.condition_order;
    let help_order: Vec<Condition> = order
        .iter()
        .copied()
        .filter(|c| HELP_CONDITIONS.contains(c))
        .collect();
    let raw = CsvFormat::raw();
    let report = config.csv_format();
    let stats = stats_format(config);
    let tests = config.test_config();
    let seed = config.analysis.seed;

    let sheet = QuestionnaireSheet::read(questionnaire_path)
        .with_context(|| format!("Failed to load questionnaire from {}", questionnaire_path.display()))?;
    let data = extract(&sheet, &config.inputs.questionnaire);

    let mut out = RunWriter::new(dir);
    out.table("subjective_long_TLX_SSQ.csv", &data.long_table(), &raw)?;
    out.table("subjective_long_helpfulness.csv", &data.helpfulness_table(), &raw)?;

    let tlx = data.tlx_measures();
    let ssq = data.ssq_measures();
    let help = data.help_measures();
    out.table("desc_TLX.csv", &describe(&tlx, order), &report)?;
    out.table("desc_SSQ.csv", &describe(&ssq, order), &report)?;
    out.table("desc_helpfulness.csv", &describe(&help, &help_order), &report)?;

    // SSQ items are described but not tested
    let ssq_scores = data.ssq_score_measures();
    let tested = tlx
        .iter()
        .chain(ssq_scores.iter())
        .map(|m| (m, order.as_slice()))
        .chain(help.iter().map(|m| (m, help_order.as_slice())));

    let mut matrices = Vec::new();
    for (measure, conditions) in tested {
        let wide = measure_matrix(measure, conditions)?;
        let name = &measure.name;
        out.table(&format!("pivot_{}.csv", name), &wide_matrix_table(&wide), &raw)?;
        let analysis = analyze_measure(&wide, &tests)?;
        out.test_results(
            name,
            &analysis,
            &format!("friedman_{}.txt", name),
            &format!("posthoc_{}.csv", name),
            &stats,
        )?;
        matrices.push((name.clone(), wide));
    }

    let matrix = |name: &str| matrices.iter().find(|(n, _)| n == name).map(|(_, w)| w);
    if let Some(wide) = matrix("TLX_overall") {
        out.figure("TLX_overall_box.svg", |path| {
            plot::box_scatter(path, wide, "NASA-TLX overall by condition", "TLX_overall", seed)
        });
    }
    if let Some(wide) = matrix("SSQ_total") {
        out.figure("SSQ_total_box.svg", |path| {
            plot::box_scatter(path, wide, "SSQ total by condition", "SSQ_total", seed)
        });
    }

    let help_labels: Vec<String> = help_order.iter().map(|c| c.to_string()).collect();
    for measure in &help {
        let means: Vec<Option<f64>> = help_order.iter().map(|&c| mean(&measure.values_for(c))).collect();
        let sds: Vec<Option<f64>> = help_order
            .iter()
            .map(|&c| sample_sd(&measure.values_for(c)))
            .collect();
        out.figure(&format!("{}_bar.svg", measure.name), |path| {
            plot::bar_mean_sd(
                path,
                &help_labels,
                &means,
                &sds,
                &format!("{} (mean ± SD)", measure.name),
                &measure.name,
            )
        });
    }

    tracing::info!(dir = %dir.path().display(), "subjective analysis complete");
    out.finish()
}
