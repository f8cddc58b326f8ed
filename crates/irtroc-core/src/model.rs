//! Core data model types for irtroc.
//!
//! These are the values that flow through the evaluation protocol: parsed
//! response records, per-user histories, the attributes a model sees, and the
//! `(actual, predicted)` datapoints that come out the other end.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single response by one user to one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// User identifier. Consecutive records with the same user form a history.
    pub user: String,
    /// Exercise identifier, matching the model's exercise names.
    pub exercise: String,
    /// Seconds spent on the exercise.
    pub time_taken: f64,
    /// Whether the user answered correctly.
    pub correct: bool,
}

impl ResponseRecord {
    /// The attributes of this response that a model is allowed to see.
    pub fn to_history_item(&self) -> HistoryItem {
        HistoryItem {
            exercise: self.exercise.clone(),
            correct: self.correct,
            time_taken: self.time_taken,
        }
    }
}

/// Output of the line parser: a record plus its held-out flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub record: ResponseRecord,
    /// Whether the input explicitly marked this response as held-out.
    pub is_evaluation: bool,
}

/// Plain response attributes handed to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub exercise: String,
    pub correct: bool,
    pub time_taken: f64,
}

/// One user's contiguous responses, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct UserHistory {
    pub user: String,
    pub responses: Vec<ResponseRecord>,
    /// Positions in `responses` flagged as held-out, in encounter order.
    pub evaluation_indexes: Vec<usize>,
}

impl UserHistory {
    /// Start an empty history for `user`.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            responses: Vec::new(),
            evaluation_indexes: Vec::new(),
        }
    }

    /// Append a response, remembering its position if it is held-out.
    pub fn push(&mut self, record: ResponseRecord, is_evaluation: bool) {
        self.responses.push(record);
        if is_evaluation {
            self.evaluation_indexes.push(self.responses.len() - 1);
        }
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// A `(ground truth, predicted probability)` pair for ROC analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    /// `1` if the held-out response was correct, `0` otherwise.
    pub actual: u8,
    /// The model's probability of a correct response, in `[0, 1]`.
    pub predicted: f64,
}

impl Datapoint {
    pub fn new(correct: bool, predicted: f64) -> Self {
        Self {
            actual: u8::from(correct),
            predicted,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.actual == 1
    }
}

impl fmt::Display for Datapoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.actual, self.predicted)
    }
}

/// A user's history split into held-out probes and the untainted remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct HeldOutSplit {
    pub user: String,
    /// Removed records, in removal order (highest original index first).
    pub held_out: Vec<ResponseRecord>,
    /// The history with every held-out record excised.
    pub remaining: Vec<HistoryItem>,
    /// Whether the held-out item was picked at random because none was flagged.
    pub used_fallback: bool,
}
