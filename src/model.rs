//! Cached server-owned state.

pub use frames::LeaderboardEntry;
use frames::{ScoreUpdate, UserRecord};

/// The local player's score and rank, as last reported by the server.
///
/// Both fields always change together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub score: u64,
    pub position: u32,
}

impl From<UserRecord> for PlayerState {
    fn from(record: UserRecord) -> Self {
        Self { score: record.score, position: record.position }
    }
}

impl From<ScoreUpdate> for PlayerState {
    fn from(update: ScoreUpdate) -> Self {
        Self { score: update.new_score, position: update.position }
    }
}

/// Result of the initial fetch after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub player: PlayerState,
    pub leaderboard: Vec<LeaderboardEntry>,
}
