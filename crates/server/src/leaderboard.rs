//! Survival-time leaderboard.

use protocol::packets::LeaderboardRecord;

/// Entries kept on the board.
pub const LEADERBOARD_SIZE: usize = 5;

/// A finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub duration_ms: u64,
}

/// Longest survival times, highest first. Entries never expire.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(LEADERBOARD_SIZE + 1),
        }
    }

    /// Record a run and return the resulting board. Equal durations keep
    /// submission order.
    pub fn submit(&mut self, name: impl Into<String>, duration_ms: u64) -> &[LeaderboardEntry] {
        self.entries.push(LeaderboardEntry {
            name: name.into(),
            duration_ms,
        });
        // `sort_by` is stable.
        self.entries.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
        self.entries.truncate(LEADERBOARD_SIZE);
        &self.entries
    }

    #[inline]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn records(&self) -> Vec<LeaderboardRecord> {
        self.entries
            .iter()
            .map(|e| LeaderboardRecord {
                name: e.name.clone(),
                time_ms: e.duration_ms,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(board: &Leaderboard) -> Vec<&str> {
        board.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_longer_run_ranks_higher() {
        let mut board = Leaderboard::new();
        board.submit("first", 1_000);
        board.submit("second", 2_000);
        assert_eq!(names(&board), vec!["second", "first"]);
    }

    #[test]
    fn test_truncates_to_five() {
        let mut board = Leaderboard::new();
        for (i, d) in [500, 100, 900, 300, 700, 200, 800].iter().enumerate() {
            board.submit(format!("p{i}"), *d);
        }
        let durations: Vec<u64> = board.entries().iter().map(|e| e.duration_ms).collect();
        assert_eq!(durations, vec![900, 800, 700, 500, 300]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut board = Leaderboard::new();
        board.submit("a", 100);
        board.submit("b", 100);
        board.submit("c", 200);
        board.submit("d", 100);
        assert_eq!(names(&board), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_short_run_does_not_enter_full_board() {
        let mut board = Leaderboard::new();
        for i in 0..5 {
            board.submit(format!("p{i}"), 1_000 + i);
        }
        board.submit("late", 10);
        assert!(!names(&board).contains(&"late"));
        assert_eq!(board.records().len(), 5);
    }
}
