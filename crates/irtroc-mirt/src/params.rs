//! MIRT parameter file loading.
//!
//! The file is a JSON document whose `params` object holds the flattened
//! coupling matrix (`theta_flat`), the number of latent abilities, and the
//! exercise-to-row mapping. Everything else is carried through untouched.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MirtError;

/// Top-level shape of a parameter file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirtFile {
    pub params: MirtParams,
    /// Any other top-level keys (title, slug, description, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `params` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirtParams {
    /// Row-major coupling parameters, reshaped by [`crate::Theta::from_params`].
    pub theta_flat: Vec<f64>,
    /// Number of latent ability dimensions.
    pub num_abilities: usize,
    /// Exercise name → row in the coupling matrix.
    pub exercise_ind_dict: BTreeMap<String, i64>,
    /// Exercises considered live in production.
    #[serde(default)]
    pub live_exercises: Option<Vec<String>>,
    /// Remaining parameters, opaque to irtroc.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MirtFile {
    pub fn from_json_str(content: &str) -> Result<Self, MirtError> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Read and parse a parameter file.
pub fn load_params(path: &Path) -> Result<MirtFile, MirtError> {
    let content = std::fs::read_to_string(path).map_err(|source| MirtError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file = MirtFile::from_json_str(&content)?;
    tracing::debug!(
        exercises = file.params.exercise_ind_dict.len(),
        abilities = file.params.num_abilities,
        theta_len = file.params.theta_flat.len(),
        "loaded MIRT parameters from {}",
        path.display()
    );
    Ok(file)
}
