//! irtroc-core: Held-out evaluation protocol for ability-estimation models.
//!
//! This crate defines the data model, the line parser and data-format
//! profiles, per-user history grouping, held-out selection, the predictor
//! traits, and the datapoint sink that the rest of irtroc builds on.

pub mod config;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod format;
pub mod history;
pub mod holdout;
pub mod mock;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;
pub mod traits;

pub use error::EvalError;
