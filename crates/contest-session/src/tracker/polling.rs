//! 单个轮询序列的两个后台任务：周期查询与上限计时。

use std::sync::Arc;
use std::time::Duration;

use arena_core::domain::SubmissionId;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{PollSettings, SequenceToken, StopReason, TrackerShared};
use crate::api::JudgeApi;

/// 运行中的轮询序列。析构时会终止两个任务。
pub(super) struct PollingSequence {
    token: SequenceToken,
    cancel: CancellationToken,
    ticker: JoinHandle<()>,
    ceiling: JoinHandle<()>,
}

impl PollingSequence {
    pub(super) fn spawn(
        shared: Arc<TrackerShared>,
        api: Arc<dyn JudgeApi>,
        settings: PollSettings,
        token: SequenceToken,
        submission_id: SubmissionId,
    ) -> Self {
        let cancel = CancellationToken::new();
        let started = Instant::now();

        let ticker = tokio::spawn(run_ticker(
            shared.clone(),
            api,
            token,
            submission_id,
            started,
            settings.interval,
            cancel.clone(),
        ));
        let ceiling = tokio::spawn(run_ceiling(
            shared,
            token,
            started + settings.ceiling,
            cancel.clone(),
        ));

        debug!(sequence = %token, %submission_id, "polling sequence started");

        Self {
            token,
            cancel,
            ticker,
            ceiling,
        }
    }

    pub(super) fn token(&self) -> SequenceToken {
        self.token
    }

    pub(super) fn cancel(&self) {
        self.cancel.cancel();
        self.ticker.abort();
        self.ceiling.abort();
    }
}

impl Drop for PollingSequence {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_ticker(
    shared: Arc<TrackerShared>,
    api: Arc<dyn JudgeApi>,
    token: SequenceToken,
    submission_id: SubmissionId,
    started: Instant,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticks = time::interval_at(started + interval, interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticks.tick() => {}
        }

        attempt += 1;
        debug!(sequence = %token, %submission_id, attempt, "fetching submission status");

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            fetched = api.fetch_submission(submission_id) => fetched,
        };

        match fetched {
            Ok(snapshot) => match shared.record(token, snapshot) {
                Some(false) => {}
                Some(true) => {
                    info!(sequence = %token, %submission_id, attempt, "submission reached a verdict");
                    cancel.cancel();
                    break;
                }
                None => break,
            },
            Err(err) => {
                warn!(sequence = %token, %submission_id, error = %err, "status fetch failed, polling stopped");
                shared.stop(token, StopReason::FetchFailed, Some(err.to_string()));
                cancel.cancel();
                break;
            }
        }
    }
}

async fn run_ceiling(
    shared: Arc<TrackerShared>,
    token: SequenceToken,
    deadline: Instant,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = time::sleep_until(deadline) => {
            if shared.stop(token, StopReason::Ceiling, None) {
                info!(sequence = %token, "polling ceiling reached, keeping last known status");
            }
            cancel.cancel();
        }
    }
}
