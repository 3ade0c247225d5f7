use anyhow::Result;
use arena_core::domain::{ContestId, ProblemId, SubmissionId, SubmissionStatus, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::tracker::{SequenceToken, StopReason};

/// 会话对外广播的事件类型。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// 用户身份已确定。
    IdentityResolved { user_id: UserId, username: String },
    /// 比赛数据加载完成。
    ContestLoaded {
        contest_id: ContestId,
        problem_count: usize,
    },
    /// 比赛数据加载失败。
    ContestLoadFailed { contest_id: ContestId, error: String },
    /// 当前题目切换。
    ProblemSelected { problem_id: ProblemId },
    /// 提交已创建，开始轮询。
    SubmissionCreated {
        sequence: SequenceToken,
        submission_id: SubmissionId,
        status: SubmissionStatus,
    },
    /// 轮询得到新的提交快照。
    SubmissionUpdated {
        sequence: SequenceToken,
        submission_id: SubmissionId,
        status: SubmissionStatus,
    },
    /// 轮询结束，`status` 为最后已知状态。
    SubmissionFinished {
        sequence: SequenceToken,
        submission_id: SubmissionId,
        status: SubmissionStatus,
        reason: StopReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 提交创建失败。
    SubmissionRejected { sequence: SequenceToken, error: String },
    /// 创建响应到达时序列已被取代或取消，服务端的这次提交不再追踪。
    SubmissionDiscarded {
        sequence: SequenceToken,
        submission_id: SubmissionId,
        status: SubmissionStatus,
    },
    /// 排行榜已刷新。
    LeaderboardUpdated {
        contest_id: ContestId,
        entry_count: usize,
    },
    /// 排行榜刷新失败，下一周期仍会继续。
    LeaderboardFetchFailed {
        contest_id: ContestId,
        error: String,
        consecutive_failures: u32,
    },
    /// 会话已退出比赛。
    SessionClosed,
}

/// 基于 `tokio::broadcast` 的事件广播器。
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// 创建事件广播器。
    ///
    /// `capacity` 表示内部广播队列容量。
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 广播一个事件，没有订阅者时直接丢弃。
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }

    /// 订阅事件流。
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 事件接收流包装器。
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl EventStream {
    /// 异步接收下一条事件。
    pub async fn recv(&mut self) -> Result<SessionEvent> {
        Ok(self.receiver.recv().await?)
    }

    /// 非阻塞尝试接收一条事件。
    pub fn try_recv(&mut self) -> Result<SessionEvent> {
        Ok(self.receiver.try_recv()?)
    }
}
