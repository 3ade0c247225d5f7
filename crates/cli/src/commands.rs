//! 终端命令解析。

use std::path::PathBuf;

use arena_core::domain::ProblemId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Problems,
    Select(ProblemId),
    Show,
    Submit(PathBuf),
    Status,
    Board,
    History,
    Contests,
    Help,
    Quit,
}

impl Command {
    pub const USAGE: &'static str = "\
commands:
  problems        list problems of the contest
  select <id>     select a problem
  show            show the selected problem
  submit <file>   submit the file as solution to the selected problem
  status          show the tracked submission
  board           show the leaderboard
  history         list your submissions
  contests        list all contests
  quit            leave the contest";

    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(None);
        };
        let arg = parts.next();

        let command = match (name, arg) {
            ("problems", None) => Self::Problems,
            ("select", Some(id)) => Self::Select(
                id.parse()
                    .map_err(|_| format!("invalid problem id: {id}"))?,
            ),
            ("show", None) => Self::Show,
            ("submit", Some(path)) => Self::Submit(PathBuf::from(path)),
            ("status", None) => Self::Status,
            ("board", None) => Self::Board,
            ("history", None) => Self::History,
            ("contests", None) => Self::Contests,
            ("help", None) => Self::Help,
            ("quit" | "exit", None) => Self::Quit,
            ("select" | "submit", None) => return Err(format!("{name} needs an argument")),
            _ => return Err(format!("unknown command: {}", line.trim())),
        };

        if parts.next().is_some() {
            return Err(format!("too many arguments: {}", line.trim()));
        }
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            Command::parse("select 12"),
            Ok(Some(Command::Select(ProblemId::new(12))))
        );
        assert_eq!(
            Command::parse("  submit sol.py "),
            Ok(Some(Command::Submit(PathBuf::from("sol.py"))))
        );
        assert_eq!(Command::parse("exit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn blank_line_is_not_a_command() {
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Command::parse("select twelve").is_err());
        assert!(Command::parse("submit").is_err());
        assert!(Command::parse("board now").is_err());
        assert!(Command::parse("dance").is_err());
    }
}
