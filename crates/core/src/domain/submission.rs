use chrono::NaiveDateTime;

use super::{ProblemId, SubmissionId, SubmissionStatus, UserId};

/// Snapshot of a submission as last reported by the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: SubmissionId,
    pub status: SubmissionStatus,
    pub code: String,
    pub submitted_at: Option<NaiveDateTime>,
}

impl Submission {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub user_id: UserId,
    pub problem_id: ProblemId,
    pub code: String,
}
