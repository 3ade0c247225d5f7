use std::sync::Arc;

use arena_core::domain::{
    Contest, ContestId, ContestSummary, Problem, ProblemId, SessionIdentity, Submission,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{AccountApi, ContestApi, JudgeApi};
use crate::config::ClientConfig;
use crate::error::{Result, SessionError};
use crate::events::{EventBroadcaster, EventStream, SessionEvent};
use crate::identity::IdentityResolver;
use crate::leaderboard::LeaderboardSync;
use crate::session::{SessionContext, SessionId, SessionView};
use crate::tracker::{PollSettings, SubmissionHandle, SubmissionTracker};

struct ViewState {
    view: SessionView,
    /// 每次进入或退出比赛递增，用于丢弃过期的加载结果。
    epoch: u64,
}

/// 比赛会话控制器。
///
/// 持有当前比赛与题目选择，把提交转交给 [`SubmissionTracker`]，
/// 并负责排行榜同步与提交轮询的启动和回收。
/// 会话被丢弃时，后台任务随组件一起终止。
pub struct ContestSession {
    context: SessionContext,
    contests: Arc<dyn ContestApi>,
    judge: Arc<dyn JudgeApi>,
    tracker: SubmissionTracker,
    leaderboard: LeaderboardSync,
    events: Arc<EventBroadcaster>,
    state: RwLock<ViewState>,
}

impl ContestSession {
    /// 解析用户名并创建会话。
    pub async fn join<A>(api: Arc<A>, config: &ClientConfig, username: &str) -> Result<Self>
    where
        A: AccountApi + JudgeApi + ContestApi + 'static,
    {
        let context = IdentityResolver::new(api.clone()).establish(username).await?;
        Ok(Self::new(api, config, context))
    }

    pub fn new<A>(api: Arc<A>, config: &ClientConfig, context: SessionContext) -> Self
    where
        A: JudgeApi + ContestApi + 'static,
    {
        let events = Arc::new(EventBroadcaster::new(config.event_buffer_size));
        let judge: Arc<dyn JudgeApi> = api.clone();
        let contests: Arc<dyn ContestApi> = api;

        info!(
            session_id = %context.id(),
            user_id = %context.identity().user_id(),
            username = context.identity().username(),
            "session established"
        );
        events.emit(SessionEvent::IdentityResolved {
            user_id: context.identity().user_id(),
            username: context.identity().username().to_string(),
        });

        Self {
            tracker: SubmissionTracker::new(
                judge.clone(),
                PollSettings::from(config.polling),
                events.clone(),
            ),
            leaderboard: LeaderboardSync::new(
                contests.clone(),
                config.leaderboard.refresh_interval(),
                events.clone(),
            ),
            context,
            contests,
            judge,
            events,
            state: RwLock::new(ViewState {
                view: SessionView::default(),
                epoch: 0,
            }),
        }
    }

    pub fn id(&self) -> &SessionId {
        self.context.id()
    }

    pub fn identity(&self) -> &SessionIdentity {
        self.context.identity()
    }

    pub fn tracker(&self) -> &SubmissionTracker {
        &self.tracker
    }

    pub fn leaderboard(&self) -> &LeaderboardSync {
        &self.leaderboard
    }

    pub fn subscribe_events(&self) -> EventStream {
        self.events.subscribe()
    }

    pub async fn view(&self) -> SessionView {
        self.state.read().await.view.clone()
    }

    /// 加载比赛、默认选中第一题并启动排行榜同步。
    ///
    /// 已在其他比赛中时先退出。加载失败时界面保持空状态，不会自动重试。
    #[tracing::instrument(skip(self), fields(session_id = %self.context.id()))]
    pub async fn enter(&self, contest_id: ContestId) -> Result<Contest> {
        let epoch = {
            let mut state = self.state.write().await;
            if state.view.contest.is_some() {
                drop(state);
                self.teardown().await;
                state = self.state.write().await;
            }
            state.epoch += 1;
            state.view.contest = None;
            state.view.selected = None;
            state.epoch
        };

        let contest = match self.contests.fetch_contest(contest_id).await {
            Ok(contest) => contest,
            Err(err) => {
                warn!(%contest_id, error = %err, "failed to load contest");
                self.events.emit(SessionEvent::ContestLoadFailed {
                    contest_id,
                    error: err.to_string(),
                });
                return Err(SessionError::ContestLoad {
                    contest_id,
                    source: err,
                });
            }
        };

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!(%contest_id, "session left the contest while it was loading");
            return Err(SessionError::NotEntered);
        }

        let selected = contest.first_problem().map(|problem| problem.id);
        state.view.contest = Some(contest.clone());
        state.view.selected = selected;
        self.leaderboard.start(contest_id).await;
        drop(state);

        info!(
            %contest_id,
            problem_count = contest.problems.len(),
            "contest loaded"
        );
        self.events.emit(SessionEvent::ContestLoaded {
            contest_id,
            problem_count: contest.problems.len(),
        });
        if let Some(problem_id) = selected {
            self.events.emit(SessionEvent::ProblemSelected { problem_id });
        }

        Ok(contest)
    }

    /// 切换当前题目，不产生网络请求，也不影响提交追踪。
    pub async fn select_problem(&self, problem_id: ProblemId) -> Result<Problem> {
        let mut state = self.state.write().await;
        let contest = state.view.contest.as_ref().ok_or(SessionError::NotEntered)?;
        let problem = contest
            .problem(problem_id)
            .cloned()
            .ok_or(SessionError::UnknownProblem(problem_id))?;
        state.view.selected = Some(problem_id);
        drop(state);

        debug!(%problem_id, title = %problem.title, "problem selected");
        self.events.emit(SessionEvent::ProblemSelected { problem_id });
        Ok(problem)
    }

    pub async fn edit_code(&self, code: impl Into<String>) {
        self.state.write().await.view.code = code.into();
    }

    pub async fn code(&self) -> String {
        self.state.read().await.view.code.clone()
    }

    /// 以当前题目和会话身份提交代码。未选中题目时直接拒绝，不产生任何副作用。
    #[tracing::instrument(skip(self, code), fields(session_id = %self.context.id()))]
    pub async fn submit_current(&self, code: impl Into<String>) -> Result<SubmissionHandle> {
        let code = code.into();
        let problem_id = {
            let mut state = self.state.write().await;
            let Some(problem_id) = state.view.selected else {
                debug!("submit ignored, no problem selected");
                return Err(SessionError::NoProblemSelected);
            };
            state.view.code = code.clone();
            problem_id
        };

        self.tracker
            .submit(self.context.identity(), problem_id, code)
            .await
    }

    /// 退出比赛：停止排行榜同步并取消进行中的提交轮询。
    #[tracing::instrument(skip(self), fields(session_id = %self.context.id()))]
    pub async fn exit(&self) {
        {
            let mut state = self.state.write().await;
            state.epoch += 1;
            state.view.contest = None;
            state.view.selected = None;
        }
        self.teardown().await;
        info!("left contest");
        self.events.emit(SessionEvent::SessionClosed);
    }

    async fn teardown(&self) {
        self.leaderboard.stop().await;
        self.tracker.cancel().await;
    }

    /// 列出全部比赛。
    pub async fn contests(&self) -> Result<Vec<ContestSummary>> {
        Ok(self.contests.list_contests().await?)
    }

    /// 当前用户的历史提交。
    pub async fn history(&self) -> Result<Vec<Submission>> {
        Ok(self
            .judge
            .list_user_submissions(self.context.identity().user_id())
            .await?)
    }
}
