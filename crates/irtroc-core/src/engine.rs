//! Held-out evaluation driver.
//!
//! Streams response lines, groups them into per-user histories, excises the
//! held-out responses, and asks a freshly reset model for one prediction per
//! held-out response.

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::Rng;

use crate::emitter::DatapointEmitter;
use crate::error::EvalError;
use crate::history::HistoryBuilder;
use crate::holdout::split_held_out;
use crate::model::{Datapoint, UserHistory};
use crate::parser::LineParser;
use crate::traits::{is_probability, PredictorFactory};

/// Counters and datapoints for one evaluation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    /// Every datapoint, in emission order.
    pub datapoints: Vec<Datapoint>,
    /// Histories finalized (a user reappearing later counts again).
    pub users: usize,
    /// Records parsed.
    pub records: usize,
    /// Users whose held-out item was chosen at random.
    pub fallback_users: usize,
    /// Blank input lines.
    pub skipped_lines: usize,
}

/// Progress reporting trait.
pub trait ProgressReporter {
    fn on_user_complete(&self, user: &str, datapoints: &[Datapoint]);
    fn on_run_complete(&self, outcome: &RunOutcome, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_user_complete(&self, _: &str, _: &[Datapoint]) {}
    fn on_run_complete(&self, _: &RunOutcome, _: Duration) {}
}

/// Runs the held-out protocol over one input stream.
pub struct Evaluator<'a> {
    factory: &'a dyn PredictorFactory,
    parser: LineParser,
}

impl<'a> Evaluator<'a> {
    pub fn new(factory: &'a dyn PredictorFactory, parser: LineParser) -> Self {
        Self { factory, parser }
    }

    /// Evaluate every user in `input`, writing datapoints through `emitter`.
    ///
    /// A malformed line aborts the run.
    pub fn evaluate<B, W, R>(
        &self,
        input: B,
        emitter: &mut DatapointEmitter<W>,
        rng: &mut R,
        progress: &dyn ProgressReporter,
    ) -> Result<RunOutcome>
    where
        B: BufRead,
        W: Write,
        R: Rng,
    {
        let start = Instant::now();
        let first_point = emitter.datapoints().len();
        let mut outcome = RunOutcome::default();
        let mut builder = HistoryBuilder::new();

        for (i, line) in input.lines().enumerate() {
            let line_no = i + 1;
            let line = line.with_context(|| format!("failed to read input line {line_no}"))?;
            if line.trim().is_empty() {
                tracing::debug!(line = line_no, "skipping blank line");
                outcome.skipped_lines += 1;
                continue;
            }

            let parsed = self
                .parser
                .parse_line(&line)
                .with_context(|| format!("line {line_no}"))?;
            outcome.records += 1;

            if let Some(done) = builder.push(parsed) {
                self.finalize(done, emitter, rng, progress, &mut outcome)?;
            }
        }

        if let Some(last) = builder.finish() {
            self.finalize(last, emitter, rng, progress, &mut outcome)?;
        }

        outcome.datapoints = emitter.datapoints()[first_point..].to_vec();

        let elapsed = start.elapsed();
        tracing::info!(
            model = self.factory.name(),
            users = outcome.users,
            records = outcome.records,
            datapoints = outcome.datapoints.len(),
            fallback_users = outcome.fallback_users,
            "evaluation complete in {:.2}s",
            elapsed.as_secs_f64()
        );
        progress.on_run_complete(&outcome, elapsed);

        Ok(outcome)
    }

    /// Turn one finished history into datapoints.
    fn finalize<W: Write, R: Rng>(
        &self,
        history: UserHistory,
        emitter: &mut DatapointEmitter<W>,
        rng: &mut R,
        progress: &dyn ProgressReporter,
        outcome: &mut RunOutcome,
    ) -> Result<()> {
        let user = history.user.clone();
        outcome.users += 1;

        let Some(split) =
            split_held_out(history, rng).with_context(|| format!("user '{user}'"))?
        else {
            return Ok(());
        };
        if split.used_fallback {
            outcome.fallback_users += 1;
        }

        let model = self
            .factory
            .reset_for_new_user()
            .with_context(|| format!("failed to reset model for user '{user}'"))?;

        // All held-out responses are already gone from `remaining`.
        let mut points = Vec::with_capacity(split.held_out.len());
        for item in &split.held_out {
            let predicted = model
                .estimate_accuracy(&split.remaining, &item.exercise)
                .with_context(|| {
                    format!(
                        "prediction failed for user '{user}' on exercise '{}'",
                        item.exercise
                    )
                })?;
            if !is_probability(predicted) {
                return Err(EvalError::InvalidProbability {
                    exercise: item.exercise.clone(),
                    value: predicted,
                })
                .with_context(|| format!("user '{user}'"));
            }

            let point = Datapoint::new(item.correct, predicted);
            emitter
                .emit(point)
                .context("failed to write datapoint")?;
            points.push(point);
        }

        tracing::debug!(
            user = %user,
            held_out = points.len(),
            history = split.remaining.len(),
            fallback = split.used_fallback,
            "user finalized"
        );
        progress.on_user_complete(&user, &points);
        Ok(())
    }
}
