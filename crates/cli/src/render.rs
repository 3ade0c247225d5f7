//! 终端输出格式。

use arena_core::domain::{Contest, LeaderboardEntry, Problem, ProblemId, Submission, ranked};
use contest_session::{SessionEvent, TrackerPhase, TrackerSnapshot};

pub fn problems(contest: &Contest, selected: Option<ProblemId>) -> String {
    let mut out = format!("{} ({} problems)\n", contest.name, contest.problems.len());
    for problem in &contest.problems {
        let marker = if Some(problem.id) == selected { '*' } else { ' ' };
        out.push_str(&format!("{marker} [{}] {}\n", problem.id, problem.title));
    }
    out
}

pub fn problem(problem: &Problem) -> String {
    format!(
        "{}\n\n{}\n\nexample input:\n{}\n\nexample output:\n{}\n",
        problem.title, problem.description, problem.input_example, problem.output_example
    )
}

pub fn leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "no submissions yet\n".to_string();
    }
    ranked(entries)
        .map(|(rank, entry)| format!("#{rank:<3} {:<20} {} solved\n", entry.username, entry.solved_count))
        .collect()
}

pub fn submission(submission: &Submission) -> String {
    let submitted = submission
        .submitted_at
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("[{}] {} (submitted {submitted})", submission.id, submission.status)
}

pub fn tracker(snapshot: &TrackerSnapshot) -> String {
    let phase = match snapshot.phase {
        TrackerPhase::Idle => "idle".to_string(),
        TrackerPhase::Submitting => "submitting...".to_string(),
        TrackerPhase::Polling => "judging...".to_string(),
        TrackerPhase::Terminal(reason) => format!("stopped ({reason:?})"),
    };
    let mut out = match &snapshot.submission {
        Some(current) => format!("{} - {phase}", submission(current)),
        None => phase,
    };
    if let Some(error) = &snapshot.error {
        out.push_str(&format!("\nerror: {error}"));
    }
    out
}

/// 需要提示给用户的事件，其余事件只写日志。
pub fn event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::SubmissionCreated { submission_id, status, .. } => {
            Some(format!("submission {submission_id} created: {status}"))
        }
        SessionEvent::SubmissionUpdated { submission_id, status, .. } => {
            Some(format!("submission {submission_id}: {status}"))
        }
        SessionEvent::SubmissionFinished {
            submission_id,
            status,
            reason,
            error,
            ..
        } => Some(match error {
            Some(error) => format!("submission {submission_id} stopped at {status}: {error}"),
            None => format!("submission {submission_id} finished: {status} ({reason:?})"),
        }),
        SessionEvent::SubmissionRejected { error, .. } => Some(format!("submission failed: {error}")),
        SessionEvent::SubmissionDiscarded { submission_id, .. } => Some(format!(
            "submission {submission_id} was created after it was withdrawn, not tracked"
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::domain::{SubmissionId, SubmissionStatus, UserId};
    use contest_session::{SequenceToken, StopReason};

    #[test]
    fn leaderboard_lists_ranks_in_order() {
        let entries = vec![
            LeaderboardEntry {
                username: "bob".to_string(),
                user_id: UserId::new(2),
                solved_count: 2,
            },
            LeaderboardEntry {
                username: "alice".to_string(),
                user_id: UserId::new(1),
                solved_count: 2,
            },
        ];

        let out = leaderboard(&entries);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("#1") && lines[0].contains("bob"));
        assert!(lines[1].starts_with("#2") && lines[1].contains("alice"));
        assert_eq!(leaderboard(&[]), "no submissions yet\n");
    }

    #[test]
    fn tracker_shows_last_known_status_after_stop() {
        let snapshot = TrackerSnapshot {
            phase: TrackerPhase::Terminal(StopReason::Ceiling),
            submission: Some(Submission {
                id: SubmissionId::new(9),
                status: SubmissionStatus::Pending,
                code: String::new(),
                submitted_at: None,
            }),
            ..TrackerSnapshot::default()
        };

        let out = tracker(&snapshot);
        assert!(out.contains("Pending"));
        assert!(out.contains("Ceiling"));
        assert!(!out.contains("judging"));
    }

    #[test]
    fn only_submission_events_are_printed() {
        assert!(event(&SessionEvent::SessionClosed).is_none());
        let line = event(&SessionEvent::SubmissionFinished {
            sequence: SequenceToken::default(),
            submission_id: SubmissionId::new(3),
            status: SubmissionStatus::Accepted,
            reason: StopReason::Verdict,
            error: None,
        })
        .expect("finished events are shown");
        assert!(line.contains("Accepted"));
    }
}
