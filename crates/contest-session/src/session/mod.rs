//! 会话模型与比赛会话控制器。

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use arena_core::domain::{Contest, ContestId, Problem, ProblemId, SessionIdentity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 比赛会话控制器实现。
pub mod controller;
/// 导出比赛会话控制器。
pub use controller::ContestSession;

/// 编辑器初始内容。
pub const DEFAULT_CODE_TEMPLATE: &str = "# Write your Python code here\n";

/// 会话唯一标识，仅用于日志关联。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// 生成新的随机会话 ID。
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 会话上下文：整个会话期间不变的身份信息，显式传给各组件。
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: SessionId,
    identity: Arc<SessionIdentity>,
}

impl SessionContext {
    pub fn new(identity: SessionIdentity) -> Self {
        Self {
            id: SessionId::new(),
            identity: Arc::new(identity),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }
}

/// 会话的界面状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// 比赛快照，加载完成前为空。
    pub contest: Option<Contest>,
    /// 当前选中的题目。
    pub selected: Option<ProblemId>,
    /// 编辑器内容。
    pub code: String,
}

impl SessionView {
    pub fn contest_id(&self) -> Option<ContestId> {
        self.contest.as_ref().map(|contest| contest.id)
    }

    pub fn selected_problem(&self) -> Option<&Problem> {
        let selected = self.selected?;
        self.contest.as_ref()?.problem(selected)
    }
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            contest: None,
            selected: None,
            code: DEFAULT_CODE_TEMPLATE.to_string(),
        }
    }
}
