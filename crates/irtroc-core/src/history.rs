//! Groups a stream of parsed records into contiguous per-user histories.

use crate::model::{ParsedRecord, UserHistory};

/// Buffers records until the user changes.
///
/// A history is only complete once the next user's first record arrives (or
/// the input ends), so callers must call [`HistoryBuilder::finish`] after the
/// last record or the final user is lost. Only the active history is held;
/// a user who reappears after another user starts a separate history.
#[derive(Debug, Default)]
pub struct HistoryBuilder {
    active: Option<UserHistory>,
}

impl HistoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Returns the previous user's history when this record
    /// starts a new user.
    pub fn push(&mut self, parsed: ParsedRecord) -> Option<UserHistory> {
        let ParsedRecord {
            record,
            is_evaluation,
        } = parsed;

        if let Some(active) = self.active.as_mut() {
            if active.user == record.user {
                active.push(record, is_evaluation);
                return None;
            }
        }

        let mut next = UserHistory::new(record.user.clone());
        next.push(record, is_evaluation);
        self.active.replace(next)
    }

    /// Flush the last active history.
    pub fn finish(self) -> Option<UserHistory> {
        self.active
    }
}
