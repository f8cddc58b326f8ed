//! Delimited response-line parser.
//!
//! Decodes one comma-separated line into a [`ParsedRecord`] using a
//! [`DataFormat`] profile and an optional held-out flag column.

use crate::error::EvalError;
use crate::format::DataFormat;
use crate::model::{ParsedRecord, ResponseRecord};

/// Spellings accepted as a correct response.
const CORRECT_TRUTHY: &[&str] = &["true", "True", "1"];

/// Spellings accepted as a held-out flag. Numeric `1` is deliberately absent.
const EVALUATION_TRUTHY: &[&str] = &["true", "True"];

/// Parses input lines according to a data-format profile.
#[derive(Debug, Clone, Copy)]
pub struct LineParser {
    format: DataFormat,
    evaluation_index: Option<usize>,
}

impl LineParser {
    /// `evaluation_index` is the column holding the held-out flag, if any.
    /// Without it every record is unflagged and each user falls back to a
    /// random held-out item.
    pub fn new(format: DataFormat, evaluation_index: Option<usize>) -> Self {
        Self {
            format,
            evaluation_index,
        }
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    pub fn evaluation_index(&self) -> Option<usize> {
        self.evaluation_index
    }

    /// Minimum number of fields a line must have.
    pub fn required_fields(&self) -> usize {
        let max = match self.evaluation_index {
            Some(i) => self.format.max_index().max(i),
            None => self.format.max_index(),
        };
        max + 1
    }

    /// Parse a single line.
    pub fn parse_line(&self, line: &str) -> Result<ParsedRecord, EvalError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(EvalError::MalformedRecord {
                reason: "empty line".into(),
            });
        }

        let fields: Vec<&str> = line.split(',').collect();
        let needed = self.required_fields();
        if fields.len() < needed {
            return Err(EvalError::MissingFields {
                needed,
                found: fields.len(),
            });
        }

        let raw_time = fields[self.format.time_taken];
        let time_taken = raw_time
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| EvalError::MalformedRecord {
                reason: format!("time_taken '{raw_time}' is not a number"),
            })?;

        let is_evaluation = self
            .evaluation_index
            .is_some_and(|i| is_evaluation_flag(fields[i]));

        Ok(ParsedRecord {
            record: ResponseRecord {
                user: fields[self.format.user].to_string(),
                exercise: fields[self.format.exercise].to_string(),
                time_taken,
                correct: is_correct(fields[self.format.correct]),
            },
            is_evaluation,
        })
    }
}

/// Truthiness of the `correct` column.
pub fn is_correct(field: &str) -> bool {
    CORRECT_TRUTHY.contains(&field)
}

/// Truthiness of the held-out flag column.
pub fn is_evaluation_flag(field: &str) -> bool {
    EVALUATION_TRUTHY.contains(&field)
}
