//! MIRT model error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur loading or querying a MIRT model.
#[derive(Debug, Error)]
pub enum MirtError {
    /// The parameter file could not be read.
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parameter file is not valid JSON or lacks required fields.
    #[error("invalid model parameters: {0}")]
    Json(#[from] serde_json::Error),

    /// `theta_flat` does not fit the declared exercises and abilities.
    #[error(
        "theta_flat has {len} values; expected {couplings} (correctness only) or {with_time} \
         (with time model) for {exercises} exercises and {abilities} abilities"
    )]
    ShapeMismatch {
        len: usize,
        couplings: usize,
        with_time: usize,
        exercises: usize,
        abilities: usize,
    },

    /// The declared rows and abilities describe a model too large to index.
    #[error("model with rows up to {max_row} and {abilities} abilities is too large")]
    InvalidShape { max_row: usize, abilities: usize },

    /// An exercise maps to a row that cannot be used.
    #[error("exercise '{exercise}' has invalid row {row}")]
    InvalidRow { exercise: String, row: i64 },

    /// The target exercise is not part of the model.
    #[error("unknown exercise: {0}")]
    UnknownExercise(String),

    /// The target exercise is outside the live set while the live filter is on.
    #[error("exercise '{0}' is not live")]
    NotLive(String),
}
