//! Client state: one reducer store, its events and effects, and the view
//! model it projects.

pub mod event;
pub mod leaderboard;
pub mod store;
pub mod ui;
pub mod view;

pub use event::{Cue, Effect, Event, Input};
pub use leaderboard::{LeaderboardRow, display_rows};
pub use store::Store;
pub use view::{GameView, Pose, RegistrationView, ViewModel};
