//! The `irtroc run` command.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::NamedTempFile;

use irtroc_core::config::load_config_from;
use irtroc_core::emitter::DatapointEmitter;
use irtroc_core::engine::{Evaluator, ProgressReporter, RunOutcome};
use irtroc_core::model::Datapoint;
use irtroc_core::parser::LineParser;
use irtroc_core::report::{EvalReport, RunInputs};
use irtroc_core::statistics::Summary;
use irtroc_core::traits::PredictorFactory;
use irtroc_mirt::MirtEngine;

use super::summarize::summary_table;

/// Users between progress lines.
const PROGRESS_EVERY: usize = 1000;

/// Console progress reporter.
struct ConsoleReporter {
    users: std::cell::Cell<usize>,
}

impl ProgressReporter for ConsoleReporter {
    fn on_user_complete(&self, _user: &str, _datapoints: &[Datapoint]) {
        let users = self.users.get() + 1;
        self.users.set(users);
        if users % PROGRESS_EVERY == 0 {
            eprintln!("  {users} users evaluated");
        }
    }

    fn on_run_complete(&self, outcome: &RunOutcome, elapsed: Duration) {
        eprintln!(
            "\nComplete: {} users, {} records, {} datapoints ({} random held-out) ({:.1}s)",
            outcome.users,
            outcome.records,
            outcome.datapoints.len(),
            outcome.fallback_users,
            elapsed.as_secs_f64()
        );
    }
}

pub struct RunArgs {
    pub model: PathBuf,
    pub test_data: PathBuf,
    pub output: PathBuf,
    pub data_format: Option<String>,
    pub evaluation_index: Option<usize>,
    pub seed: Option<u64>,
    pub report: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let format_name = args
        .data_format
        .unwrap_or_else(|| config.default_format.clone());
    let format = config.format_registry().get(&format_name)?;
    let evaluation_index = args.evaluation_index.or(config.evaluation_index);
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    tracing::info!(
        data_format = %format_name,
        evaluation_index = ?evaluation_index,
        seed,
        "starting evaluation"
    );

    let engine = MirtEngine::load(&args.model)
        .with_context(|| format!("failed to load model: {}", args.model.display()))?
        .for_evaluation();

    let input = File::open(&args.test_data)
        .with_context(|| format!("failed to open test data: {}", args.test_data.display()))?;

    // Datapoints go to a temp file next to the destination, which only
    // replaces the destination once the whole run has succeeded.
    let out_dir = output_dir(&args.output);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let tmp = NamedTempFile::new_in(out_dir)
        .with_context(|| format!("failed to create temp file in {}", out_dir.display()))?;

    let mut emitter = DatapointEmitter::new(BufWriter::new(tmp));
    let mut rng = StdRng::seed_from_u64(seed);
    let reporter = ConsoleReporter {
        users: std::cell::Cell::new(0),
    };

    eprintln!(
        "irtroc v{}: evaluating {} against {}",
        env!("CARGO_PKG_VERSION"),
        args.model.display(),
        args.test_data.display()
    );

    let evaluator = Evaluator::new(&engine, LineParser::new(format, evaluation_index));
    let outcome = evaluator.evaluate(BufReader::new(input), &mut emitter, &mut rng, &reporter)?;

    let (writer, _) = emitter.finish().context("failed to flush datapoints")?;
    let tmp = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("failed to flush datapoints")?;
    tmp.persist(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    eprintln!("Datapoints saved to: {}", args.output.display());

    let summary = Summary::compute(&outcome.datapoints);
    eprintln!("\n{}", summary_table(&summary));

    if let Some(report_path) = &args.report {
        let report = EvalReport::new(
            RunInputs {
                model: engine.name().to_string(),
                model_file: args.model.clone(),
                test_file: args.test_data.clone(),
                output_file: args.output.clone(),
                data_format: format_name,
                evaluation_index,
                seed,
            },
            &outcome,
        );
        report.save_json(report_path)?;
        eprintln!("Report saved to: {}", report_path.display());
    }

    Ok(())
}

fn output_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
