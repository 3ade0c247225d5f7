use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.get()
            }
        }
    };
}

define_id_type!(UserId);
define_id_type!(ContestId);
define_id_type!(ProblemId);
define_id_type!(SubmissionId);

#[cfg(test)]
mod tests {
    use super::{ContestId, UserId};

    #[test]
    fn user_id_can_roundtrip_from_string() {
        let id = UserId::new(42);
        let parsed: UserId = id
            .to_string()
            .parse()
            .expect("rendered user id should parse");

        assert_eq!(id, parsed);
    }

    #[test]
    fn contest_id_parse_tolerates_surrounding_whitespace() {
        let parsed: ContestId = " 7\n".parse().expect("padded id should parse");
        assert_eq!(parsed.get(), 7);

        assert!("seven".parse::<ContestId>().is_err());
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&UserId::new(3)).expect("serialize id");
        assert_eq!(json, "3");
    }
}
