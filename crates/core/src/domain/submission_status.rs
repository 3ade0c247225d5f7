use std::fmt;

use serde::{Deserialize, Serialize};

/// Judge verdict as reported by the server.
///
/// Only `Pending` and `Running` are in-progress; every other label, including
/// ones the client has never seen, is terminal and kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionStatus {
    Pending,
    Running,
    Accepted,
    WrongAnswer,
    Other(String),
}

impl SubmissionStatus {
    pub const PENDING: &'static str = "Pending";
    pub const RUNNING: &'static str = "Running";
    pub const ACCEPTED: &'static str = "Accepted";
    pub const WRONG_ANSWER: &'static str = "Wrong Answer";

    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        match label.as_str() {
            Self::PENDING => Self::Pending,
            Self::RUNNING => Self::Running,
            Self::ACCEPTED => Self::Accepted,
            Self::WRONG_ANSWER => Self::WrongAnswer,
            _ => Self::Other(label),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pending => Self::PENDING,
            Self::Running => Self::RUNNING,
            Self::Accepted => Self::ACCEPTED,
            Self::WrongAnswer => Self::WRONG_ANSWER,
            Self::Other(label) => label,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

impl From<String> for SubmissionStatus {
    fn from(value: String) -> Self {
        Self::from_label(value)
    }
}

impl From<&str> for SubmissionStatus {
    fn from(value: &str) -> Self {
        Self::from_label(value)
    }
}

impl From<SubmissionStatus> for String {
    fn from(value: SubmissionStatus) -> Self {
        match value {
            SubmissionStatus::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
