use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use feedback_stats::cli::{Analysis, Cli};
use feedback_stats::config::AnalysisConfig;
use feedback_stats::pipeline::{run_objective, run_subjective, RunDirectory, RunSummary};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; warnings only unless RUST_LOG or --debug
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_analyses(
    analysis: Analysis,
    config: &AnalysisConfig,
    timestamp: NaiveDateTime,
) -> Result<Vec<RunSummary>> {
    let root = &config.paths.output_root;
    let trials = config.paths.trials.as_deref();
    let questionnaire = config.paths.questionnaire.as_deref();

    let (objective, subjective) = match analysis {
        Analysis::Objective => match trials {
            Some(path) => (Some(path), None),
            None => anyhow::bail!("Objective analysis needs a trial log. Use --trials or [paths].trials."),
        },
        Analysis::Subjective => match questionnaire {
            Some(path) => (None, Some(path)),
            None => anyhow::bail!(
                "Subjective analysis needs a questionnaire. Use --questionnaire or [paths].questionnaire."
            ),
        },
        Analysis::All => {
            if trials.is_none() && questionnaire.is_none() {
                anyhow::bail!("No inputs given. Use --trials and/or --questionnaire.");
            }
            (trials, questionnaire)
        }
    };

    let mut summaries = Vec::new();
    if let Some(path) = objective {
        let dir = RunDirectory::create(root, "objective", timestamp)?;
        summaries.push(run_objective(config, path, &dir)?);
    }
    if let Some(path) = subjective {
        let dir = RunDirectory::create(root, "subjective", timestamp)?;
        summaries.push(run_subjective(config, path, &dir)?);
    }
    Ok(summaries)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = args.load_config()?;
    let timestamp = Local::now().naive_local();

    for summary in run_analyses(args.analysis, &config, timestamp)? {
        print!("{}", summary.to_text());
    }
    Ok(())
}
