pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod leaderboard;
pub mod session;
pub mod tracker;

pub use api::{AccountApi, ContestApi, HttpApiClient, JudgeApi, LoginOutcome};
pub use config::{ClientConfig, LeaderboardConfig, PollingConfig};
pub use error::{ApiError, ApiResult, Result, SessionError};
pub use events::{EventBroadcaster, EventStream, SessionEvent};
pub use identity::IdentityResolver;
pub use leaderboard::{LeaderboardSnapshot, LeaderboardSync};
pub use session::{ContestSession, SessionContext, SessionId, SessionView};
pub use tracker::{
    PollSettings, SequenceToken, StopReason, SubmissionHandle, SubmissionTracker, TrackerOutcome,
    TrackerPhase, TrackerSnapshot,
};
