//! Held-out item selection.
//!
//! Every held-out response is excised from the history before any prediction
//! is made, so no probe can leak into the evidence used for another probe of
//! the same user.

use rand::Rng;

use crate::error::EvalError;
use crate::model::{HeldOutSplit, ResponseRecord, UserHistory};

/// Split a finished history into held-out probes and the remaining evidence.
///
/// Flagged positions are removed highest first so earlier positions stay
/// valid. With no flagged positions exactly one response is drawn uniformly
/// from `rng`. An empty history yields `Ok(None)`.
pub fn split_held_out<R: Rng>(
    history: UserHistory,
    rng: &mut R,
) -> Result<Option<HeldOutSplit>, EvalError> {
    let UserHistory {
        user,
        mut responses,
        evaluation_indexes,
    } = history;

    if responses.is_empty() {
        return Ok(None);
    }

    let len = responses.len();
    let mut indexes = evaluation_indexes;
    indexes.sort_unstable_by(|a, b| b.cmp(a));
    indexes.dedup();

    if let Some(&index) = indexes.iter().find(|&&i| i >= len) {
        return Err(EvalError::IndexOutOfRange { index, len });
    }

    let used_fallback = indexes.is_empty();
    if used_fallback {
        indexes.push(rng.gen_range(0..len));
    }

    let held_out: Vec<ResponseRecord> = indexes.iter().map(|&i| responses.remove(i)).collect();
    let remaining = responses.iter().map(ResponseRecord::to_history_item).collect();

    Ok(Some(HeldOutSplit {
        user,
        held_out,
        remaining,
        used_fallback,
    }))
}
