use super::UserId;

/// One standings row. Rank is the position in the server-provided list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub user_id: UserId,
    pub solved_count: u32,
}

/// Pairs each entry with its 1-based rank, keeping server order for ties.
pub fn ranked(entries: &[LeaderboardEntry]) -> impl Iterator<Item = (usize, &LeaderboardEntry)> {
    entries.iter().enumerate().map(|(index, entry)| (index + 1, entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(username: &str, user_id: i64, solved_count: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            username: username.to_string(),
            user_id: UserId::new(user_id),
            solved_count,
        }
    }

    #[test]
    fn ties_keep_server_order() {
        let entries = vec![entry("carol", 3, 2), entry("bob", 2, 1), entry("alice", 1, 1)];

        let ranks: Vec<(usize, &str)> = ranked(&entries)
            .map(|(rank, entry)| (rank, entry.username.as_str()))
            .collect();

        assert_eq!(ranks, vec![(1, "carol"), (2, "bob"), (3, "alice")]);
    }
}
