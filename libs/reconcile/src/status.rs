//! Cluster status classification.
//!
//! Magnum reports status as strings like `CREATE_IN_PROGRESS` or
//! `UPDATE_FAILED`. The loop never matches whole strings; only the suffix
//! family decides what happens next, so new verb prefixes keep working.

/// Classified remote status, derived from the raw status string's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// An asynchronous operation is still running remotely.
    InProgress,
    /// The last operation finished; the cluster is stable and actionable.
    Complete,
    /// The last operation failed; fault detail accompanies the status.
    Failed,
    /// A status string outside the known vocabulary.
    Unknown,
}

impl StatusClass {
    /// Classify a raw status string by suffix.
    pub fn classify(status: &str) -> Self {
        if status.ends_with("FAILED") {
            Self::Failed
        } else if status.ends_with("PROGRESS") {
            Self::InProgress
        } else if status.ends_with("COMPLETE") {
            Self::Complete
        } else {
            Self::Unknown
        }
    }

    /// True when the cluster is stable and actionable.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// True while an asynchronous operation is running.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}
