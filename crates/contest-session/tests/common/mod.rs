#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arena_core::domain::{
    Contest, ContestId, ContestSummary, LeaderboardEntry, NewSubmission, Problem, ProblemId,
    SessionIdentity, Submission, SubmissionId, SubmissionStatus, UserId,
};
use async_trait::async_trait;
use contest_session::{AccountApi, ApiError, ApiResult, ContestApi, JudgeApi, LoginOutcome};
use tokio::sync::Notify;
use tokio::time::Instant;

/// One scripted answer to a status fetch.
#[derive(Clone)]
pub enum Step {
    Status(SubmissionStatus),
    Fail,
    /// Blocks until the gate is notified, then answers with the status.
    Held(Arc<Notify>, SubmissionStatus),
}

/// In-memory stand-in for the contest server.
#[derive(Default)]
pub struct ScriptedApi {
    users: Mutex<HashMap<String, i64>>,
    next_user_id: AtomicI64,
    pub login_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub fail_login: AtomicBool,
    pub fail_register: AtomicBool,

    contests: Mutex<HashMap<ContestId, Contest>>,
    pub contest_calls: AtomicUsize,

    leaderboard: Mutex<Vec<LeaderboardEntry>>,
    pub fail_leaderboard: AtomicBool,
    pub leaderboard_fetches: Mutex<Vec<Instant>>,

    next_submission_id: AtomicI64,
    pub fail_create: AtomicBool,
    hold_create: Mutex<Option<Arc<Notify>>>,
    pub created: Mutex<Vec<NewSubmission>>,
    scripts: Mutex<HashMap<i64, VecDeque<Step>>>,
    last_status: Mutex<HashMap<i64, SubmissionStatus>>,
    pub fetches: Mutex<Vec<(SubmissionId, Instant)>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_user_id: AtomicI64::new(1),
            next_submission_id: AtomicI64::new(100),
            ..Self::default()
        })
    }

    pub fn with_user(self: &Arc<Self>, username: &str) -> i64 {
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        self.users.lock().unwrap().insert(username.to_string(), id);
        id
    }

    pub fn with_contest(self: &Arc<Self>, id: i64, name: &str, problem_ids: &[i64]) -> Contest {
        let contest = Contest {
            id: ContestId::new(id),
            name: name.to_string(),
            problems: problem_ids
                .iter()
                .map(|pid| Problem {
                    id: ProblemId::new(*pid),
                    title: format!("Problem {pid}"),
                    description: "Add two numbers".to_string(),
                    input_example: "2 3".to_string(),
                    output_example: "5".to_string(),
                })
                .collect(),
        };
        self.contests
            .lock()
            .unwrap()
            .insert(contest.id, contest.clone());
        contest
    }

    pub fn set_leaderboard(&self, entries: Vec<LeaderboardEntry>) {
        *self.leaderboard.lock().unwrap() = entries;
    }

    /// Script the status answers for the next created submission id.
    pub fn script_next(&self, steps: Vec<Step>) -> SubmissionId {
        let id = self.next_submission_id.load(Ordering::SeqCst);
        self.scripts.lock().unwrap().insert(id, steps.into());
        SubmissionId::new(id)
    }

    /// The next creation request answers only after the gate is notified.
    pub fn hold_next_create(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold_create.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fetch_count(&self, submission_id: SubmissionId) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == submission_id)
            .count()
    }

    pub fn leaderboard_fetch_count(&self) -> usize {
        self.leaderboard_fetches.lock().unwrap().len()
    }
}

pub fn entry(username: &str, user_id: i64, solved_count: u32) -> LeaderboardEntry {
    LeaderboardEntry {
        username: username.to_string(),
        user_id: UserId::new(user_id),
        solved_count,
    }
}

#[async_trait]
impl AccountApi for ScriptedApi {
    async fn login(&self, username: &str) -> ApiResult<LoginOutcome> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(ApiError::status(503, "login unavailable"));
        }
        let users = self.users.lock().unwrap();
        Ok(match users.get(username) {
            Some(id) => LoginOutcome::Found(SessionIdentity::new(UserId::new(*id), username)),
            None => LoginOutcome::NotFound,
        })
    }

    async fn register(&self, username: &str) -> ApiResult<SessionIdentity> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(ApiError::status(503, "register unavailable"));
        }
        let mut users = self.users.lock().unwrap();
        if users.contains_key(username) {
            return Err(ApiError::status(400, "Username already exists"));
        }
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        users.insert(username.to_string(), id);
        Ok(SessionIdentity::new(UserId::new(id), username))
    }
}

#[async_trait]
impl JudgeApi for ScriptedApi {
    async fn create_submission(&self, submission: &NewSubmission) -> ApiResult<Submission> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ApiError::status(500, "judge unavailable"));
        }
        let id = self.next_submission_id.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push(submission.clone());
        self.last_status
            .lock()
            .unwrap()
            .insert(id, SubmissionStatus::Pending);

        let gate = self.hold_create.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        Ok(Submission {
            id: SubmissionId::new(id),
            status: SubmissionStatus::Pending,
            code: submission.code.clone(),
            submitted_at: None,
        })
    }

    async fn fetch_submission(&self, submission_id: SubmissionId) -> ApiResult<Submission> {
        self.fetches
            .lock()
            .unwrap()
            .push((submission_id, Instant::now()));

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&submission_id.get())
            .and_then(VecDeque::pop_front);

        let status = match step {
            Some(Step::Fail) => return Err(ApiError::status(502, "bad gateway")),
            Some(Step::Status(status)) => status,
            Some(Step::Held(gate, status)) => {
                gate.notified().await;
                status
            }
            None => {
                let statuses = self.last_status.lock().unwrap();
                statuses
                    .get(&submission_id.get())
                    .cloned()
                    .ok_or_else(|| ApiError::status(404, "no such submission"))?
            }
        };

        self.last_status
            .lock()
            .unwrap()
            .insert(submission_id.get(), status.clone());

        let code = self
            .created
            .lock()
            .unwrap()
            .get((submission_id.get() - 100) as usize)
            .map(|s| s.code.clone())
            .unwrap_or_default();

        Ok(Submission {
            id: submission_id,
            status,
            code,
            submitted_at: None,
        })
    }

    async fn list_user_submissions(&self, user_id: UserId) -> ApiResult<Vec<Submission>> {
        let created = self.created.lock().unwrap();
        let statuses = self.last_status.lock().unwrap();
        Ok(created
            .iter()
            .enumerate()
            .filter(|(_, s)| s.user_id == user_id)
            .map(|(index, s)| {
                let id = 100 + index as i64;
                Submission {
                    id: SubmissionId::new(id),
                    status: statuses
                        .get(&id)
                        .cloned()
                        .unwrap_or(SubmissionStatus::Pending),
                    code: s.code.clone(),
                    submitted_at: None,
                }
            })
            .collect())
    }
}

#[async_trait]
impl ContestApi for ScriptedApi {
    async fn fetch_contest(&self, contest_id: ContestId) -> ApiResult<Contest> {
        self.contest_calls.fetch_add(1, Ordering::SeqCst);
        self.contests
            .lock()
            .unwrap()
            .get(&contest_id)
            .cloned()
            .ok_or_else(|| ApiError::status(404, "Not Found"))
    }

    async fn list_contests(&self) -> ApiResult<Vec<ContestSummary>> {
        let contests = self.contests.lock().unwrap();
        let mut summaries: Vec<ContestSummary> =
            contests.values().map(ContestSummary::from).collect();
        summaries.sort_by_key(|summary| summary.id);
        Ok(summaries)
    }

    async fn fetch_leaderboard(&self, _contest_id: ContestId) -> ApiResult<Vec<LeaderboardEntry>> {
        self.leaderboard_fetches.lock().unwrap().push(Instant::now());
        if self.fail_leaderboard.load(Ordering::SeqCst) {
            return Err(ApiError::status(500, "leaderboard unavailable"));
        }
        Ok(self.leaderboard.lock().unwrap().clone())
    }
}
