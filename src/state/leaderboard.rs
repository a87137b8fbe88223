//! Leaderboard display policy.
//!
//! Collapsed: top three entries, plus the current player's own row when they
//! rank below that. Expanded: every entry.

use crate::model::{LeaderboardEntry, PlayerState};

const COLLAPSED_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// `(username, index in the displayed list)`. Unique per render.
    pub key: (String, usize),
    pub username: String,
    pub score: u64,
    pub position: u32,
    pub is_current_user: bool,
}

/// Rows to display for `entries` from `username`'s point of view.
///
/// The extra collapsed row prefers the cached `player` values over the list's
/// so it matches the score shown elsewhere. A player missing from the list
/// gets no extra row.
#[must_use]
pub fn display_rows(
    entries: &[LeaderboardEntry],
    username: &str,
    player: Option<PlayerState>,
    expanded: bool,
) -> Vec<LeaderboardRow> {
    if expanded {
        return entries
            .iter()
            .enumerate()
            .map(|(i, entry)| row(i, entry, username, entry.score, listed_position(entry, i)))
            .collect();
    }

    let mut rows: Vec<_> = entries
        .iter()
        .take(COLLAPSED_ROWS)
        .enumerate()
        .map(|(i, entry)| row(i, entry, username, entry.score, listed_position(entry, i)))
        .collect();

    let own = entries
        .iter()
        .enumerate()
        .skip(COLLAPSED_ROWS)
        .find(|(_, entry)| entry.username == username);
    if let Some((i, entry)) = own {
        let (score, position) = match player {
            Some(p) => (p.score, p.position),
            None => (entry.score, listed_position(entry, i)),
        };
        rows.push(row(rows.len(), entry, username, score, position));
    }

    rows
}

fn listed_position(entry: &LeaderboardEntry, index: usize) -> u32 {
    entry
        .position
        .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX))
}

fn row(index: usize, entry: &LeaderboardEntry, username: &str, score: u64, position: u32) -> LeaderboardRow {
    LeaderboardRow {
        key: (entry.username.clone(), index),
        username: entry.username.clone(),
        score,
        position,
        is_current_user: entry.username == username,
    }
}

#[cfg(test)]
#[path = "leaderboard_test.rs"]
mod tests;
