//! Core trait definitions for predictive models.
//!
//! The evaluation driver treats the model as an opaque predictor: it asks a
//! [`PredictorFactory`] for a fresh [`AccuracyModel`] per user and queries it
//! once per held-out response. Implemented by the `irtroc-mirt` crate.

use crate::model::HistoryItem;

// ---------------------------------------------------------------------------
// Predictor traits
// ---------------------------------------------------------------------------

/// Builds per-user models from loaded parameters.
pub trait PredictorFactory {
    /// Human-readable model name (e.g. "mirt").
    fn name(&self) -> &str;

    /// A model reinitialized to population parameters, with no state from
    /// any previous user.
    fn reset_for_new_user(&self) -> anyhow::Result<Box<dyn AccuracyModel>>;
}

/// A model that predicts the probability of a correct response.
pub trait AccuracyModel {
    /// Probability that the user answers `exercise` correctly given
    /// `history`. Implementations re-derive ability from the full history on
    /// every call.
    fn estimate_accuracy(&self, history: &[HistoryItem], exercise: &str) -> anyhow::Result<f64>;
}

/// Whether `value` can be used as a predicted probability.
pub fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
