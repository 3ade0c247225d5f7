mod contest;
mod error;
mod identity;
mod ids;
mod leaderboard;
mod submission;
mod submission_status;

pub use contest::{Contest, ContestSummary, Problem};
pub use error::DomainError;
pub use identity::{SessionIdentity, Username};
pub use ids::{ContestId, ProblemId, SubmissionId, UserId};
pub use leaderboard::{LeaderboardEntry, ranked};
pub use submission::{NewSubmission, Submission};
pub use submission_status::SubmissionStatus;
