// Non-parametric repeated-measures hypothesis testing
//
// Within-subject comparison of the feedback conditions:
// - Friedman rank test across all conditions (omnibus)
// - Wilcoxon signed-rank tests for every pair of conditions (post hoc)
// - Exact binomial sign test as fallback and secondary diagnostic
// - Bonferroni correction over the pairs actually attempted
//
// Every "could not be computed" state is an explicit variant or `None`,
// never a zero statistic or a sentinel p-value.

mod config;
mod engine;
mod friedman;
mod ranks;
mod wilcoxon;

pub use config::TestConfig;
pub use engine::{analyze_measure, omnibus, pairwise, MeasureAnalysis, OmnibusOutcome, PairwiseResult};
pub use friedman::{friedman, FriedmanTest};
pub use ranks::average_ranks;
pub use sign_test::{sign_counts, sign_test};
pub use wilcoxon::{wilcoxon_signed_rank, WilcoxonMethod, WilcoxonTest};
