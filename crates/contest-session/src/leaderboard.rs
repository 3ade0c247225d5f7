//! 排行榜同步器。
//!
//! 启动时立即拉取一次，之后按固定周期刷新。单次失败只记录日志，
//! 不会中断后续周期。

use std::sync::Arc;
use std::time::Duration;

use arena_core::domain::{ContestId, LeaderboardEntry};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ContestApi;
use crate::events::{EventBroadcaster, SessionEvent};

/// 排行榜当前快照。`entries` 的顺序即名次。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardSnapshot {
    pub contest_id: Option<ContestId>,
    pub entries: Vec<LeaderboardEntry>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    generation: u64,
}

impl LeaderboardSnapshot {
    /// 至少成功加载过一次。
    pub fn is_loaded(&self) -> bool {
        self.refreshed_at.is_some()
    }
}

struct RefreshTask {
    contest_id: ContestId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    fn stop(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct LeaderboardSync {
    api: Arc<dyn ContestApi>,
    refresh_interval: Duration,
    events: Arc<EventBroadcaster>,
    board: Arc<watch::Sender<LeaderboardSnapshot>>,
    running: Mutex<Option<RefreshTask>>,
}

impl LeaderboardSync {
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

    pub fn new(
        api: Arc<dyn ContestApi>,
        refresh_interval: Duration,
        events: Arc<EventBroadcaster>,
    ) -> Self {
        let (board, _) = watch::channel(LeaderboardSnapshot::default());
        Self {
            api,
            refresh_interval,
            events,
            board: Arc::new(board),
            running: Mutex::new(None),
        }
    }

    /// 开始周期刷新，已有的刷新任务会先停止。
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, contest_id: ContestId) {
        let mut running = self.running.lock().await;
        if let Some(previous) = running.take() {
            previous.stop();
        }

        let mut generation = 0;
        self.board.send_modify(|board| {
            if board.contest_id != Some(contest_id) {
                *board = LeaderboardSnapshot {
                    generation: board.generation,
                    ..LeaderboardSnapshot::default()
                };
                board.contest_id = Some(contest_id);
            }
            board.generation += 1;
            generation = board.generation;
        });

        info!(
            %contest_id,
            interval_ms = self.refresh_interval.as_millis() as u64,
            "starting leaderboard refresh"
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(refresh_loop(
            self.api.clone(),
            self.board.clone(),
            self.events.clone(),
            contest_id,
            generation,
            self.refresh_interval,
            cancel.clone(),
        ));

        *running = Some(RefreshTask {
            contest_id,
            cancel,
            handle,
        });
    }

    /// 停止周期刷新，保留最后一次快照。
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        if let Some(task) = running.take() {
            info!(contest_id = %task.contest_id, "stopping leaderboard refresh");
            task.stop();
        }
        // 迟到的响应不再写入
        self.board.send_modify(|board| board.generation += 1);
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub fn snapshot(&self) -> LeaderboardSnapshot {
        self.board.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<LeaderboardSnapshot> {
        self.board.subscribe()
    }
}

async fn refresh_loop(
    api: Arc<dyn ContestApi>,
    board: Arc<watch::Sender<LeaderboardSnapshot>>,
    events: Arc<EventBroadcaster>,
    contest_id: ContestId,
    generation: u64,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticks = time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticks.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            fetched = api.fetch_leaderboard(contest_id) => fetched,
        };

        match fetched {
            Ok(entries) => {
                let entry_count = entries.len();
                let applied = board.send_if_modified(|board| {
                    if board.generation != generation {
                        return false;
                    }
                    board.entries = entries;
                    board.refreshed_at = Some(Utc::now());
                    board.consecutive_failures = 0;
                    board.last_error = None;
                    true
                });

                if !applied {
                    break;
                }
                debug!(%contest_id, entry_count, "leaderboard refreshed");
                events.emit(SessionEvent::LeaderboardUpdated {
                    contest_id,
                    entry_count,
                });
            }
            Err(err) => {
                let error = err.to_string();
                let mut failures = None;
                board.send_if_modified(|board| {
                    if board.generation != generation {
                        return false;
                    }
                    board.consecutive_failures += 1;
                    board.last_error = Some(error.clone());
                    failures = Some(board.consecutive_failures);
                    true
                });

                let Some(consecutive_failures) = failures else {
                    break;
                };
                warn!(%contest_id, error = %error, consecutive_failures, "leaderboard refresh failed");
                events.emit(SessionEvent::LeaderboardFetchFailed {
                    contest_id,
                    error,
                    consecutive_failures,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use arena_core::domain::{Contest, ContestSummary, UserId};
    use async_trait::async_trait;

    use super::*;
    use crate::error::{ApiError, ApiResult};

    struct CountingBoard {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContestApi for CountingBoard {
        async fn fetch_contest(&self, _contest_id: ContestId) -> ApiResult<Contest> {
            Err(ApiError::status(501, "unused"))
        }

        async fn list_contests(&self) -> ApiResult<Vec<ContestSummary>> {
            Ok(Vec::new())
        }

        async fn fetch_leaderboard(&self, _contest_id: ContestId) -> ApiResult<Vec<LeaderboardEntry>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as u32;
            Ok(vec![LeaderboardEntry {
                username: "alice".to_string(),
                user_id: UserId::new(1),
                solved_count: call,
            }])
        }
    }

    fn sync() -> (LeaderboardSync, Arc<CountingBoard>) {
        let api = Arc::new(CountingBoard {
            calls: AtomicUsize::new(0),
        });
        let sync = LeaderboardSync::new(
            api.clone(),
            LeaderboardSync::DEFAULT_REFRESH_INTERVAL,
            Arc::new(EventBroadcaster::new(64)),
        );
        (sync, api)
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_immediately_then_on_cadence() {
        let (sync, api) = sync();

        sync.start(ContestId::new(1)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert!(sync.snapshot().is_loaded());

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 4);
        assert_eq!(sync.snapshot().entries[0].solved_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_cycle() {
        let (sync, api) = sync();

        sync.start(ContestId::new(1)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        sync.stop().await;
        assert!(!sync.is_running().await);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sync.snapshot().entries.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_contest_clears_previous_entries() {
        let (sync, _api) = sync();

        sync.start(ContestId::new(1)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sync.snapshot().contest_id, Some(ContestId::new(1)));

        sync.stop().await;
        sync.start(ContestId::new(2)).await;
        let snapshot = sync.snapshot();
        assert_eq!(snapshot.contest_id, Some(ContestId::new(2)));
        assert!(snapshot.entries.is_empty());
        assert!(!snapshot.is_loaded());
    }
}
