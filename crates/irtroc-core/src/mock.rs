//! Mock predictor for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::model::HistoryItem;
use crate::traits::{AccuracyModel, PredictorFactory};

/// One recorded prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionCall {
    /// Which model instance served the call (0 for the first reset).
    pub model_id: u32,
    pub history: Vec<HistoryItem>,
    pub exercise: String,
}

/// A mock predictor for testing the evaluation driver without a real model.
///
/// Returns a fixed probability per exercise and records every call.
pub struct RecordingPredictor {
    /// Map of exercise → probability.
    probabilities: HashMap<String, f64>,
    /// Probability for exercises not in the map.
    default_probability: f64,
    /// Number of models handed out.
    resets: AtomicU32,
    calls: Arc<Mutex<Vec<PredictionCall>>>,
}

impl RecordingPredictor {
    pub fn new(probabilities: HashMap<String, f64>) -> Self {
        Self {
            probabilities,
            default_probability: 0.5,
            resets: AtomicU32::new(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock that always returns the same probability.
    pub fn with_fixed_probability(probability: f64) -> Self {
        Self {
            default_probability: probability,
            ..Self::new(HashMap::new())
        }
    }

    /// Number of fresh models handed out.
    pub fn reset_count(&self) -> u32 {
        self.resets.load(Ordering::Relaxed)
    }

    /// Every prediction request so far, in order.
    pub fn calls(&self) -> Vec<PredictionCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl PredictorFactory for RecordingPredictor {
    fn name(&self) -> &str {
        "mock"
    }

    fn reset_for_new_user(&self) -> anyhow::Result<Box<dyn AccuracyModel>> {
        let model_id = self.resets.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(RecordingModel {
            model_id,
            probabilities: self.probabilities.clone(),
            default_probability: self.default_probability,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct RecordingModel {
    model_id: u32,
    probabilities: HashMap<String, f64>,
    default_probability: f64,
    calls: Arc<Mutex<Vec<PredictionCall>>>,
}

impl AccuracyModel for RecordingModel {
    fn estimate_accuracy(&self, history: &[HistoryItem], exercise: &str) -> anyhow::Result<f64> {
        self.calls.lock().unwrap().push(PredictionCall {
            model_id: self.model_id,
            history: history.to_vec(),
            exercise: exercise.to_string(),
        });
        Ok(self
            .probabilities
            .get(exercise)
            .copied()
            .unwrap_or(self.default_probability))
    }
}
