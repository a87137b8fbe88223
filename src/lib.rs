//! Client-side state synchronization for the clicker game.
//!
//! SYSTEM CONTEXT
//! ==============
//! A player registers a nickname, clicks or feeds a character to earn points,
//! and watches their own score and the global leaderboard update live. The
//! server owns every number; this crate keeps a cached copy in sync from two
//! push channels and folds it, with local animation state, into one view
//! model.
//!
//! - [`identity`]: nickname validation and local persistence
//! - [`net`]: HTTP calls and live channels
//! - [`state`]: the reducer store and its view model
//! - [`runtime`]: the event loop that wires them together

pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod net;
pub mod runtime;
pub mod state;

pub use config::ClientConfig;
pub use error::{ActionError, ConfigError, IdentityError, RegisterError, ServerError, SnapshotError, ValidationError};
pub use identity::{FileIdentityStore, Identity, IdentityStore, MemoryIdentityStore};
pub use model::{LeaderboardEntry, PlayerState, Snapshot};
pub use net::action::{ActionDispatcher, ActionKind};
pub use net::channel::{ChannelEvent, ChannelHandle, ChannelKind, ChannelStatus, spawn_channel};
pub use net::reconnect::ReconnectPolicy;
pub use net::session::SessionClient;
pub use runtime::{SessionHandle, spawn};
pub use state::{Cue, Effect, Event, GameView, Input, LeaderboardRow, Pose, RegistrationView, Store, ViewModel};
