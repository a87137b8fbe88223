//! Render-ready projection of the store.

use crate::net::channel::ChannelStatus;
use crate::state::leaderboard::LeaderboardRow;

/// Which character image to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pose {
    #[default]
    Idle,
    /// Clicked, or holding food.
    Smiling,
    Eating,
}

impl Pose {
    /// Eating beats smiling beats dragging beats idle.
    #[must_use]
    pub fn resolve(is_eating: bool, is_smiling: bool, is_dragging: bool) -> Self {
        if is_eating {
            Self::Eating
        } else if is_smiling || is_dragging {
            Self::Smiling
        } else {
            Self::Idle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationView {
    pub draft: String,
    pub error: Option<String>,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub username: String,
    /// `None` until the first snapshot or push arrives.
    pub score: Option<u64>,
    pub position: Option<u32>,
    pub pose: Pose,
    pub is_eating: bool,
    pub is_smiling: bool,
    pub is_dragging: bool,
    pub leaderboard_expanded: bool,
    pub rows: Vec<LeaderboardRow>,
    pub user_channel: ChannelStatus,
    pub leaderboard_channel: ChannelStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewModel {
    Registration(RegistrationView),
    Game(GameView),
}

impl ViewModel {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Game(_))
    }

    #[must_use]
    pub fn game(&self) -> Option<&GameView> {
        match self {
            Self::Game(game) => Some(game),
            Self::Registration(_) => None,
        }
    }

    #[must_use]
    pub fn registration(&self) -> Option<&RegistrationView> {
        match self {
            Self::Registration(form) => Some(form),
            Self::Game(_) => None,
        }
    }
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::Registration(RegistrationView { draft: String::new(), error: None, pending: false })
    }
}
