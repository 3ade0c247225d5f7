use arena_core::domain::{ContestId, DomainError, ProblemId};
use thiserror::Error;

/// 与比赛服务端通信时产生的错误。
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("请求发送失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("服务端返回 {status}: {message}")]
    Status { status: u16, message: String },

    #[error("响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("用户名无效: {0}")]
    InvalidUsername(#[from] DomainError),

    #[error("无法登录或注册用户 {username}: {reason}")]
    IdentityResolution { username: String, reason: String },

    #[error("比赛 {contest_id} 加载失败: {source}")]
    ContestLoad {
        contest_id: ContestId,
        #[source]
        source: ApiError,
    },

    #[error("尚未进入比赛")]
    NotEntered,

    #[error("未选择题目")]
    NoProblemSelected,

    #[error("题目不属于当前比赛: {0}")]
    UnknownProblem(ProblemId),

    #[error("提交创建失败: {0}")]
    SubmissionRejected(#[source] ApiError),

    #[error("提交已被更新的提交取代")]
    Superseded,

    #[error("提交在创建完成前已被取消")]
    Cancelled,

    #[error("接口错误: {0}")]
    Api(#[from] ApiError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
