//! 比赛服务端接口抽象。
//!
//! 每个组件只依赖它需要的那一组接口：身份解析依赖 [`AccountApi`]，
//! 提交追踪依赖 [`JudgeApi`]，排行榜与比赛加载依赖 [`ContestApi`]。
//! [`HttpApiClient`] 同时实现三者。

use arena_core::domain::{
    Contest, ContestId, ContestSummary, LeaderboardEntry, NewSubmission, SessionIdentity,
    Submission, SubmissionId, UserId,
};
use async_trait::async_trait;

use crate::error::ApiResult;

mod http;

pub use http::HttpApiClient;

/// 登录查询结果。用户不存在是正常分支而不是错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Found(SessionIdentity),
    NotFound,
}

#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn login(&self, username: &str) -> ApiResult<LoginOutcome>;
    async fn register(&self, username: &str) -> ApiResult<SessionIdentity>;
}

#[async_trait]
pub trait JudgeApi: Send + Sync {
    async fn create_submission(&self, submission: &NewSubmission) -> ApiResult<Submission>;
    async fn fetch_submission(&self, submission_id: SubmissionId) -> ApiResult<Submission>;
    async fn list_user_submissions(&self, user_id: UserId) -> ApiResult<Vec<Submission>>;
}

#[async_trait]
pub trait ContestApi: Send + Sync {
    async fn fetch_contest(&self, contest_id: ContestId) -> ApiResult<Contest>;
    async fn list_contests(&self) -> ApiResult<Vec<ContestSummary>>;
    /// 返回服务端排好序的排行榜，客户端不再排序。
    async fn fetch_leaderboard(&self, contest_id: ContestId) -> ApiResult<Vec<LeaderboardEntry>>;
}
