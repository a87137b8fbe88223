//! Store inputs and outputs.
//!
//! Everything that can change client state arrives as an [`Event`]; everything
//! the store wants done in the outside world leaves as an [`Effect`]. Events
//! produced by network work carry the session epoch they were started under.

use std::time::Duration;

use crate::identity::Identity;
use crate::model::Snapshot;
use crate::net::action::ActionKind;
use crate::net::channel::{ChannelEvent, ChannelKind};

/// Direct user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// The nickname field changed to this text.
    UsernameEdited(String),
    RegisterSubmitted,
    CharacterClicked,
    /// Food picked up.
    DragStarted,
    /// Food released anywhere, including after a drop.
    DragEnded,
    /// Food released on the character.
    FoodDropped,
    LeaderboardToggled,
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Input(Input),
    /// A persisted identity was found at startup.
    Resumed(Identity),
    Registered(Identity),
    RegistrationFailed { reason: String },
    SnapshotLoaded { epoch: u64, snapshot: Snapshot },
    SnapshotFailed { epoch: u64, reason: String },
    /// The server does not know the current player.
    IdentityRejected { epoch: u64 },
    Channel { epoch: u64, kind: ChannelKind, event: ChannelEvent },
    AnimationSettled { token: u64 },
}

impl From<Input> for Event {
    fn from(input: Input) -> Self {
        Self::Input(input)
    }
}

/// Sound/visual cue for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Click,
    Eating,
}

/// Work requested by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Register { username: String },
    FetchSnapshot { epoch: u64, username: String },
    OpenChannels { epoch: u64, username: String },
    CloseChannels,
    ClearIdentity,
    SendAction { username: String, kind: ActionKind },
    PlayCue(Cue),
    /// Deliver `AnimationSettled { token }` after `after`.
    ScheduleSettle { token: u64, after: Duration },
}
