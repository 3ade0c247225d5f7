//! JSON request/response types of the contest HTTP API.
//!
//! Field names follow the server's camelCase convention. Every response type
//! converts into its `arena_core` domain counterpart.

use arena_core::domain::{
    Contest, ContestId, ContestSummary, LeaderboardEntry, NewSubmission, Problem, ProblemId,
    SessionIdentity, Submission, SubmissionId, SubmissionStatus, UserId,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

impl UsernameRequest {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<UserResponse> for SessionIdentity {
    fn from(value: UserResponse) -> Self {
        SessionIdentity::new(UserId::new(value.id), value.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_example: Option<String>,
    #[serde(default)]
    pub output_example: Option<String>,
}

impl From<ProblemResponse> for Problem {
    fn from(value: ProblemResponse) -> Self {
        Problem {
            id: ProblemId::new(value.id),
            title: value.title.unwrap_or_default(),
            description: value.description.unwrap_or_default(),
            input_example: value.input_example.unwrap_or_default(),
            output_example: value.output_example.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestResponse {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub problems: Vec<ProblemResponse>,
}

impl From<ContestResponse> for Contest {
    fn from(value: ContestResponse) -> Self {
        Contest {
            id: ContestId::new(value.id),
            name: value.name.unwrap_or_default(),
            problems: value.problems.into_iter().map(Problem::from).collect(),
        }
    }
}

impl From<ContestResponse> for ContestSummary {
    fn from(value: ContestResponse) -> Self {
        ContestSummary::from(&Contest::from(value))
    }
}

/// Reference to an entity by id, as in `{"user": {"id": 1}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubmissionRequest {
    pub user: EntityRef,
    pub problem: EntityRef,
    pub code: String,
}

impl From<&NewSubmission> for CreateSubmissionRequest {
    fn from(value: &NewSubmission) -> Self {
        Self {
            user: EntityRef {
                id: value.user_id.get(),
            },
            problem: EntityRef {
                id: value.problem_id.get(),
            },
            code: value.code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub code: Option<String>,
    /// Kept as raw JSON: only used for display, an unreadable value must not
    /// fail the whole payload.
    #[serde(default)]
    pub submitted_at: Option<Value>,
}

impl From<SubmissionResponse> for Submission {
    fn from(value: SubmissionResponse) -> Self {
        Submission {
            id: SubmissionId::new(value.id),
            status: SubmissionStatus::from_label(value.status),
            code: value.code.unwrap_or_default(),
            submitted_at: value.submitted_at.as_ref().and_then(timestamp_from_json),
        }
    }
}

/// Reads `submittedAt` from a string, or from the `[year, month, day, hour,
/// minute, second, nanos]` array Jackson writes for `LocalDateTime`.
/// Anything else is treated as absent.
pub fn timestamp_from_json(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(raw) => parse_timestamp(raw),
        Value::Array(parts) => {
            let parts: Vec<i64> = parts.iter().map(Value::as_i64).collect::<Option<_>>()?;
            let field = |index: usize| parts.get(index).copied().unwrap_or(0);
            if parts.len() < 3 {
                return None;
            }
            let date = NaiveDate::from_ymd_opt(
                i32::try_from(field(0)).ok()?,
                u32::try_from(field(1)).ok()?,
                u32::try_from(field(2)).ok()?,
            )?;
            date.and_hms_nano_opt(
                u32::try_from(field(3)).ok()?,
                u32::try_from(field(4)).ok()?,
                u32::try_from(field(5)).ok()?,
                u32::try_from(field(6)).ok()?,
            )
        }
        _ => None,
    }
}

/// Accepts both zone-less local timestamps and RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    raw.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryResponse {
    pub username: String,
    pub user_id: i64,
    pub solved_count: u32,
}

impl From<LeaderboardEntryResponse> for LeaderboardEntry {
    fn from(value: LeaderboardEntryResponse) -> Self {
        LeaderboardEntry {
            username: value.username,
            user_id: UserId::new(value.user_id),
            solved_count: value.solved_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
