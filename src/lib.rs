//! feedback-stats - Repeated-measures statistics for a four-condition feedback study
//!
//! This library turns per-trial logs and questionnaire sheets into
//! participant × condition matrices, tests them with Friedman and pairwise
//! Wilcoxon signed-rank tests, estimates bootstrap confidence intervals and
//! exports report-ready tables and SVG figures.

pub mod aggregate;
pub mod bootstrap;
pub mod cli;
pub mod condition;
pub mod config;
pub mod csv_output;
pub mod descriptive;
pub mod hypothesis;
pub mod ingest;
pub mod objective;
pub mod pipeline;
pub mod plot;
pub mod subjective;
pub mod wide;
