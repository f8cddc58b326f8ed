//! Evaluation error types.
//!
//! These represent failures in the held-out evaluation protocol itself.
//! Orchestration code wraps them in `anyhow` with line or user context, so
//! callers can still downcast and classify them.

use thiserror::Error;

/// Errors that can occur while parsing records or selecting held-out items.
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    /// A line could not be decoded into a response record.
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },

    /// A line has fewer fields than the configured positions require.
    #[error("malformed record: expected at least {needed} fields, found {found}")]
    MissingFields { needed: usize, found: usize },

    /// An evaluation index does not point into the user's history.
    #[error("evaluation index {index} out of range for history of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A model returned something that is not a probability.
    #[error("model returned invalid probability {value} for exercise '{exercise}'")]
    InvalidProbability { exercise: String, value: f64 },

    /// No data-format profile is registered under this name.
    #[error("unknown data format: {0}")]
    UnknownFormat(String),

    /// A data-format profile is missing a required field.
    #[error("invalid data format: {0}")]
    InvalidFormat(String),
}

impl EvalError {
    /// Returns `true` if this error came from decoding an input line.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            EvalError::MalformedRecord { .. } | EvalError::MissingFields { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_errors_are_classified() {
        assert!(EvalError::MissingFields {
            needed: 4,
            found: 2
        }
        .is_record_error());
        assert!(EvalError::MalformedRecord {
            reason: "bad".into()
        }
        .is_record_error());
        assert!(!EvalError::IndexOutOfRange { index: 3, len: 2 }.is_record_error());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = EvalError::MissingFields {
            needed: 5,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "malformed record: expected at least 5 fields, found 3"
        );
        let err = EvalError::IndexOutOfRange { index: 7, len: 2 };
        assert!(err.to_string().contains("index 7"));
    }
}
