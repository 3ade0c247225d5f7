use super::{ContestId, ProblemId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub description: String,
    pub input_example: String,
    pub output_example: String,
}

/// Read-only contest snapshot. Problems keep the server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    pub id: ContestId,
    pub name: String,
    pub problems: Vec<Problem>,
}

impl Contest {
    pub fn problem(&self, problem_id: ProblemId) -> Option<&Problem> {
        self.problems.iter().find(|problem| problem.id == problem_id)
    }

    pub fn first_problem(&self) -> Option<&Problem> {
        self.problems.first()
    }
}

/// Directory listing entry for a contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestSummary {
    pub id: ContestId,
    pub name: String,
    pub problem_count: usize,
}

impl From<&Contest> for ContestSummary {
    fn from(contest: &Contest) -> Self {
        Self {
            id: contest.id,
            name: contest.name.clone(),
            problem_count: contest.problems.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(id: i64, title: &str) -> Problem {
        Problem {
            id: ProblemId::new(id),
            title: title.to_string(),
            description: String::new(),
            input_example: "2 3".to_string(),
            output_example: "5".to_string(),
        }
    }

    #[test]
    fn looks_up_problems_by_id() {
        let contest = Contest {
            id: ContestId::new(1),
            name: "Math Contest".to_string(),
            problems: vec![problem(10, "Sum"), problem(11, "Multiply")],
        };

        assert_eq!(contest.first_problem().map(|p| p.id), Some(ProblemId::new(10)));
        assert_eq!(
            contest.problem(ProblemId::new(11)).map(|p| p.title.as_str()),
            Some("Multiply")
        );
        assert!(contest.problem(ProblemId::new(99)).is_none());
    }

    #[test]
    fn empty_contest_has_no_first_problem() {
        let contest = Contest {
            id: ContestId::new(2),
            name: "Empty".to_string(),
            problems: Vec::new(),
        };

        assert!(contest.first_problem().is_none());
        assert_eq!(ContestSummary::from(&contest).problem_count, 0);
    }
}
