//! irtroc-mirt: Multidimensional IRT predictor.
//!
//! Loads a MIRT parameter file and implements the `PredictorFactory` and
//! `AccuracyModel` traits from `irtroc-core`, estimating a user's abilities
//! from their remaining history on every query.

pub mod engine;
pub mod error;
pub mod params;

pub use engine::{MirtEngine, MirtModel, Theta};
pub use error::MirtError;
pub use params::{load_params, MirtFile, MirtParams};
