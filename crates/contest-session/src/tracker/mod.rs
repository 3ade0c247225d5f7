//! 提交追踪器。
//!
//! 每次提交对应一个轮询序列（[`SequenceToken`]）。序列由两个独立的后台任务组成：
//! 周期性状态查询与绝对超时。任何结果写入前都会核对序列号与阶段，
//! 因此被取代或已取消的序列即使有迟到的响应也不会改动当前状态。

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use arena_core::domain::{NewSubmission, ProblemId, SessionIdentity, Submission};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::api::JudgeApi;
use crate::config::PollingConfig;
use crate::error::{Result, SessionError};
use crate::events::{EventBroadcaster, SessionEvent};

mod polling;

use polling::PollingSequence;

/// 轮询序列标识，每次提交递增。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceToken(u64);

impl SequenceToken {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for SequenceToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 轮询停止的原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 判题返回了终态。
    Verdict,
    /// 到达轮询上限时间，保留最后已知状态。
    Ceiling,
    /// 状态查询失败。
    FetchFailed,
    /// 会话退出或显式取消。
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackerPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Terminal(StopReason),
}

impl TrackerPhase {
    /// 提交中或轮询中，界面据此显示“提交中”。
    pub fn is_active(self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }
}

/// 追踪器当前可见状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub sequence: SequenceToken,
    pub phase: TrackerPhase,
    /// 最近一次整体替换得到的提交快照。
    pub submission: Option<Submission>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub ceiling: Duration,
}

impl PollSettings {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
    pub const DEFAULT_CEILING: Duration = Duration::from_secs(30);
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            ceiling: Self::DEFAULT_CEILING,
        }
    }
}

impl From<PollingConfig> for PollSettings {
    fn from(value: PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(value.interval_ms),
            ceiling: Duration::from_millis(value.ceiling_ms),
        }
    }
}

/// 创建响应落地的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Creation {
    Tracked,
    /// 响应到达前已有更新的提交。
    Superseded,
    /// 响应到达前当前序列已被取消。
    Cancelled,
}

/// 追踪器与其后台任务共享的状态。
pub(crate) struct TrackerShared {
    state: watch::Sender<TrackerSnapshot>,
    events: Arc<EventBroadcaster>,
}

impl TrackerShared {
    fn new(events: Arc<EventBroadcaster>) -> Self {
        let (state, _) = watch::channel(TrackerSnapshot::default());
        Self { state, events }
    }

    /// 开启新序列：之前序列的所有结果从此失效。
    fn begin(&self) -> SequenceToken {
        let mut token = SequenceToken::default();
        self.state.send_modify(|state| {
            state.sequence = state.sequence.next();
            state.phase = TrackerPhase::Submitting;
            state.submission = None;
            state.error = None;
            token = state.sequence;
        });
        token
    }

    fn is_live(state: &TrackerSnapshot, token: SequenceToken, phase: TrackerPhase) -> bool {
        state.sequence == token && state.phase == phase
    }

    /// 提交创建成功。序列已被取代或取消时状态保持不变，
    /// 并广播 `SubmissionDiscarded`。
    fn created(&self, token: SequenceToken, submission: &Submission) -> Creation {
        let mut outcome = Creation::Tracked;
        self.state.send_if_modified(|state| {
            if state.sequence != token {
                outcome = Creation::Superseded;
            } else if state.phase != TrackerPhase::Submitting {
                outcome = Creation::Cancelled;
            }
            if outcome != Creation::Tracked {
                self.events.emit(SessionEvent::SubmissionDiscarded {
                    sequence: token,
                    submission_id: submission.id,
                    status: submission.status.clone(),
                });
                return false;
            }

            state.phase = if submission.is_terminal() {
                TrackerPhase::Terminal(StopReason::Verdict)
            } else {
                TrackerPhase::Polling
            };
            state.submission = Some(submission.clone());

            self.events.emit(SessionEvent::SubmissionCreated {
                sequence: token,
                submission_id: submission.id,
                status: submission.status.clone(),
            });
            if submission.is_terminal() {
                self.emit_finished(token, submission, StopReason::Verdict, None);
            }
            true
        });
        outcome
    }

    fn rejected(&self, token: SequenceToken, error: String) {
        self.state.send_if_modified(|state| {
            if !Self::is_live(state, token, TrackerPhase::Submitting) {
                return false;
            }
            state.phase = TrackerPhase::Idle;
            state.error = Some(error.clone());
            self.events.emit(SessionEvent::SubmissionRejected {
                sequence: token,
                error: error.clone(),
            });
            true
        });
    }

    /// 用新快照整体替换当前提交。返回 `None` 表示结果已过期被丢弃，
    /// 否则返回快照是否为终态。
    ///
    /// 事件在状态锁内广播，与 `stop`/`cancel_current` 的事件顺序一致。
    pub(crate) fn record(&self, token: SequenceToken, snapshot: Submission) -> Option<bool> {
        let terminal = snapshot.is_terminal();
        let applied = self.state.send_if_modified(|state| {
            if !Self::is_live(state, token, TrackerPhase::Polling) {
                return false;
            }
            if terminal {
                state.phase = TrackerPhase::Terminal(StopReason::Verdict);
            }
            self.events.emit(SessionEvent::SubmissionUpdated {
                sequence: token,
                submission_id: snapshot.id,
                status: snapshot.status.clone(),
            });
            if terminal {
                self.emit_finished(token, &snapshot, StopReason::Verdict, None);
            }
            state.submission = Some(snapshot.clone());
            true
        });

        applied.then_some(terminal)
    }

    /// 结束轮询并保留最后已知状态。只有仍在轮询的当前序列会生效。
    pub(crate) fn stop(
        &self,
        token: SequenceToken,
        reason: StopReason,
        error: Option<String>,
    ) -> bool {
        self.state.send_if_modified(|state| {
            if !Self::is_live(state, token, TrackerPhase::Polling) {
                return false;
            }
            state.phase = TrackerPhase::Terminal(reason);
            if error.is_some() {
                state.error = error.clone();
            }
            if let Some(submission) = &state.submission {
                self.emit_finished(token, submission, reason, error.clone());
            }
            true
        })
    }

    /// 取消当前序列：提交中回到空闲，轮询中以 `Cancelled` 结束。
    fn cancel_current(&self) {
        self.state.send_if_modified(|state| match state.phase {
            TrackerPhase::Submitting => {
                state.phase = TrackerPhase::Idle;
                true
            }
            TrackerPhase::Polling => {
                state.phase = TrackerPhase::Terminal(StopReason::Cancelled);
                if let Some(submission) = &state.submission {
                    info!(sequence = %state.sequence, submission_id = %submission.id, "polling cancelled");
                    self.emit_finished(state.sequence, submission, StopReason::Cancelled, None);
                }
                true
            }
            _ => false,
        });
    }

    fn emit_finished(
        &self,
        token: SequenceToken,
        submission: &Submission,
        reason: StopReason,
        error: Option<String>,
    ) {
        self.events.emit(SessionEvent::SubmissionFinished {
            sequence: token,
            submission_id: submission.id,
            status: submission.status.clone(),
            reason,
            error,
        });
    }
}

/// 某次提交的句柄，可等待其轮询结束。
#[derive(Debug)]
pub struct SubmissionHandle {
    sequence: SequenceToken,
    created: Submission,
    state: watch::Receiver<TrackerSnapshot>,
}

/// 句柄等待的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerOutcome {
    /// 本序列停止，附带最后已知快照。
    Stopped {
        submission: Submission,
        reason: StopReason,
    },
    /// 在停止前被新的提交取代。
    Superseded,
}

impl SubmissionHandle {
    pub fn sequence(&self) -> SequenceToken {
        self.sequence
    }

    /// 创建接口返回的初始快照。
    pub fn created(&self) -> &Submission {
        &self.created
    }

    /// 本序列最新的快照；序列已被取代时返回 `None`。
    pub fn latest(&self) -> Option<Submission> {
        let state = self.state.borrow();
        if state.sequence != self.sequence {
            return None;
        }
        state.submission.clone()
    }

    /// 等待本序列停止或被取代。
    pub async fn finished(&mut self) -> TrackerOutcome {
        let sequence = self.sequence;
        let settled = self
            .state
            .wait_for(|state| state.sequence != sequence || !state.phase.is_active())
            .await
            .map(|state| state.clone());

        let Ok(state) = settled else {
            return TrackerOutcome::Stopped {
                submission: self.created.clone(),
                reason: StopReason::Cancelled,
            };
        };

        if state.sequence != sequence {
            return TrackerOutcome::Superseded;
        }

        let reason = match state.phase {
            TrackerPhase::Terminal(reason) => reason,
            _ => StopReason::Cancelled,
        };
        TrackerOutcome::Stopped {
            submission: state.submission.unwrap_or_else(|| self.created.clone()),
            reason,
        }
    }
}

/// 提交追踪器：同一时刻最多一个活跃轮询序列。
pub struct SubmissionTracker {
    api: Arc<dyn JudgeApi>,
    settings: PollSettings,
    shared: Arc<TrackerShared>,
    active: Mutex<Option<PollingSequence>>,
}

impl SubmissionTracker {
    pub fn new(
        api: Arc<dyn JudgeApi>,
        settings: PollSettings,
        events: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            api,
            settings,
            shared: Arc::new(TrackerShared::new(events)),
            active: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// 创建提交并开始轮询。进行中的旧序列会先被取消。
    #[tracing::instrument(skip(self, identity, code), fields(user_id = %identity.user_id()))]
    pub async fn submit(
        &self,
        identity: &SessionIdentity,
        problem_id: ProblemId,
        code: impl Into<String>,
    ) -> Result<SubmissionHandle> {
        let token = {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                info!(sequence = %previous.token(), "superseding active polling sequence");
                previous.cancel();
            }
            self.shared.begin()
        };

        let request = NewSubmission {
            user_id: identity.user_id(),
            problem_id,
            code: code.into(),
        };

        let created = match self.api.create_submission(&request).await {
            Ok(created) => created,
            Err(err) => {
                warn!(sequence = %token, error = %err, "submission creation failed");
                self.shared.rejected(token, err.to_string());
                return Err(SessionError::SubmissionRejected(err));
            }
        };

        let mut active = self.active.lock().await;
        match self.shared.created(token, &created) {
            Creation::Tracked => {}
            Creation::Superseded => {
                info!(sequence = %token, submission_id = %created.id, "creation response arrived after supersession");
                return Err(SessionError::Superseded);
            }
            Creation::Cancelled => {
                info!(sequence = %token, submission_id = %created.id, "creation response arrived after cancel");
                return Err(SessionError::Cancelled);
            }
        }

        info!(
            sequence = %token,
            submission_id = %created.id,
            status = %created.status,
            "submission created"
        );

        if !created.is_terminal() {
            *active = Some(PollingSequence::spawn(
                self.shared.clone(),
                self.api.clone(),
                self.settings,
                token,
                created.id,
            ));
        }

        Ok(SubmissionHandle {
            sequence: token,
            created,
            state: self.shared.state.subscribe(),
        })
    }

    /// 取消进行中的提交或轮询，两个定时任务都会被终止。
    pub async fn cancel(&self) {
        let mut active = self.active.lock().await;
        if let Some(sequence) = active.take() {
            sequence.cancel();
        }

        self.shared.cancel_current();
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.shared.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<TrackerSnapshot> {
        self.shared.state.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.shared.state.borrow().phase.is_active()
    }
}
