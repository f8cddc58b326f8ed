//! Run report types with JSON persistence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::RunOutcome;
use crate::statistics::Summary;

/// Metadata and summary of one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Name of the predictor that was evaluated.
    pub model: String,
    pub model_file: PathBuf,
    pub test_file: PathBuf,
    pub output_file: PathBuf,
    /// Data-format profile name.
    pub data_format: String,
    #[serde(default)]
    pub evaluation_index: Option<usize>,
    /// Seed of the fallback RNG, so a run can be reproduced.
    pub seed: u64,
    pub users: usize,
    pub records: usize,
    pub fallback_users: usize,
    pub summary: Summary,
}

/// Where a run read from and wrote to.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub model: String,
    pub model_file: PathBuf,
    pub test_file: PathBuf,
    pub output_file: PathBuf,
    pub data_format: String,
    pub evaluation_index: Option<usize>,
    pub seed: u64,
}

impl EvalReport {
    pub fn new(inputs: RunInputs, outcome: &RunOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            model: inputs.model,
            model_file: inputs.model_file,
            test_file: inputs.test_file,
            output_file: inputs.output_file,
            data_format: inputs.data_format,
            evaluation_index: inputs.evaluation_index,
            seed: inputs.seed,
            users: outcome.users,
            records: outcome.records,
            fallback_users: outcome.fallback_users,
            summary: Summary::compute(&outcome.datapoints),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvalReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
