//! 基于 reqwest 的 HTTP 接口实现。

use arena_api_types::{
    ContestResponse, CreateSubmissionRequest, ErrorResponse, LeaderboardEntryResponse,
    SubmissionResponse, UserResponse, UsernameRequest,
};
use arena_core::domain::{
    Contest, ContestId, ContestSummary, LeaderboardEntry, NewSubmission, SessionIdentity,
    Submission, SubmissionId, UserId,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{AccountApi, ContestApi, JudgeApi, LoginOutcome};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ApiResult<Response> {
        let url = self.url(path);
        debug!(%url, "POST");
        Ok(self.client.post(url).json(body).send().await?)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), error_message(status, &body)));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// 优先使用服务端 `{"error": ...}` 中的描述。
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(payload) = serde_json::from_slice::<ErrorResponse>(body) {
        return payload.error;
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        text.to_string()
    }
}

#[async_trait]
impl AccountApi for HttpApiClient {
    async fn login(&self, username: &str) -> ApiResult<LoginOutcome> {
        let response = self
            .post("/api/users/login", &UsernameRequest::new(username))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(LoginOutcome::NotFound);
        }

        let user: UserResponse = Self::decode(response).await?;
        Ok(LoginOutcome::Found(user.into()))
    }

    async fn register(&self, username: &str) -> ApiResult<SessionIdentity> {
        let response = self
            .post("/api/users/register", &UsernameRequest::new(username))
            .await?;
        let user: UserResponse = Self::decode(response).await?;
        Ok(user.into())
    }
}

#[async_trait]
impl JudgeApi for HttpApiClient {
    async fn create_submission(&self, submission: &NewSubmission) -> ApiResult<Submission> {
        let response = self
            .post("/api/submissions", &CreateSubmissionRequest::from(submission))
            .await?;
        let created: SubmissionResponse = Self::decode(response).await?;
        Ok(created.into())
    }

    async fn fetch_submission(&self, submission_id: SubmissionId) -> ApiResult<Submission> {
        let fetched: SubmissionResponse = self
            .get_json(&format!("/api/submissions/{submission_id}"))
            .await?;
        Ok(fetched.into())
    }

    async fn list_user_submissions(&self, user_id: UserId) -> ApiResult<Vec<Submission>> {
        let fetched: Vec<SubmissionResponse> = self
            .get_json(&format!("/api/submissions/user/{user_id}"))
            .await?;
        Ok(fetched.into_iter().map(Submission::from).collect())
    }
}

#[async_trait]
impl ContestApi for HttpApiClient {
    async fn fetch_contest(&self, contest_id: ContestId) -> ApiResult<Contest> {
        let contest: ContestResponse = self.get_json(&format!("/api/contests/{contest_id}")).await?;
        Ok(contest.into())
    }

    async fn list_contests(&self) -> ApiResult<Vec<ContestSummary>> {
        let contests: Vec<ContestResponse> = self.get_json("/api/contests").await?;
        Ok(contests.into_iter().map(ContestSummary::from).collect())
    }

    async fn fetch_leaderboard(&self, contest_id: ContestId) -> ApiResult<Vec<LeaderboardEntry>> {
        let entries: Vec<LeaderboardEntryResponse> = self
            .get_json(&format!("/api/contests/{contest_id}/leaderboard"))
            .await?;
        Ok(entries.into_iter().map(LeaderboardEntry::from).collect())
    }
}
