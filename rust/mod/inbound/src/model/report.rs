use std::fmt;

use serde::Serialize;

/// How far a commit got. Chunks before `chunks_committed` were acknowledged;
/// everything from there on is still staged.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommitReport {
    pub chunks_total: usize,
    pub chunks_committed: usize,
    pub entries_committed: usize,
    pub entries_pending: usize,
}

impl CommitReport {
    pub fn is_complete(&self) -> bool {
        self.entries_pending == 0
    }
}

impl fmt::Display for CommitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} committed, {} pending",
            self.entries_committed, self.entries_pending
        )
    }
}
