//! The reducer.
//!
//! DESIGN
//! ======
//! `Store::apply` is the only way client state changes. It performs no I/O:
//! it returns the effects the runtime should carry out, and the runtime feeds
//! their results back in as events.
//!
//! STALENESS
//! =========
//! Entering or leaving the authenticated state bumps `epoch`. Snapshot and
//! channel events started under an older epoch are dropped, so a slow
//! response from a previous session can never overwrite the current one.
//! Pushes that carry a `seq` are additionally dropped unless newer than the
//! last one applied on that stream; the counter restarts with each
//! connection.

use std::time::Duration;

use tracing::debug;

use crate::identity::Identity;
use crate::model::{LeaderboardEntry, PlayerState, Snapshot};
use crate::net::action::ActionKind;
use crate::net::channel::{ChannelEvent, ChannelKind, ChannelStatus};
use crate::state::event::{Cue, Effect, Event, Input};
use crate::state::leaderboard::display_rows;
use crate::state::ui::{CharacterFlags, RegistrationForm};
use crate::state::view::{GameView, Pose, RegistrationView, ViewModel};

#[derive(Debug, Clone, Default)]
struct Stream {
    status: ChannelStatus,
    last_seq: Option<u64>,
}

impl Stream {
    /// Record `seq` if it is newer than the last one. Unsequenced pushes
    /// always pass.
    fn accept(&mut self, seq: Option<u64>) -> bool {
        match (seq, self.last_seq) {
            (Some(seq), Some(last)) if seq <= last => false,
            (Some(seq), _) => {
                self.last_seq = Some(seq);
                true
            }
            (None, _) => true,
        }
    }
}

#[derive(Debug)]
pub struct Store {
    animation: Duration,
    identity: Option<Identity>,
    epoch: u64,
    player: Option<PlayerState>,
    leaderboard: Vec<LeaderboardEntry>,
    user_stream: Stream,
    leaderboard_stream: Stream,
    form: RegistrationForm,
    character: CharacterFlags,
    leaderboard_expanded: bool,
    next_token: u64,
}

impl Store {
    /// Empty, unauthenticated store. `animation` is how long click and feed
    /// poses last.
    #[must_use]
    pub fn new(animation: Duration) -> Self {
        Self {
            animation,
            identity: None,
            epoch: 0,
            player: None,
            leaderboard: Vec::new(),
            user_stream: Stream::default(),
            leaderboard_stream: Stream::default(),
            form: RegistrationForm::default(),
            character: CharacterFlags::default(),
            leaderboard_expanded: false,
            next_token: 0,
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Input(input) => self.handle_input(input),
            Event::Resumed(identity) | Event::Registered(identity) => {
                if self.identity.is_some() {
                    debug!(username = %identity, "already authenticated, ignoring");
                    return Vec::new();
                }
                self.form = RegistrationForm::default();
                self.enter(identity)
            }
            Event::RegistrationFailed { reason } => {
                if self.identity.is_none() {
                    self.form.pending = false;
                    self.form.error = Some(reason);
                }
                Vec::new()
            }
            Event::SnapshotLoaded { epoch, snapshot } => {
                if self.is_current(epoch) {
                    self.apply_snapshot(snapshot);
                }
                Vec::new()
            }
            Event::SnapshotFailed { epoch, reason } => {
                if self.is_current(epoch) {
                    debug!(%reason, "snapshot failed, keeping last-known state");
                }
                Vec::new()
            }
            Event::IdentityRejected { epoch } => {
                if !self.is_current(epoch) {
                    return Vec::new();
                }
                let draft = self.identity.as_ref().map(|i| i.username().to_owned()).unwrap_or_default();
                let mut effects = self.leave();
                self.form.draft = draft;
                effects.push(Effect::ClearIdentity);
                effects
            }
            Event::Channel { epoch, kind, event } => {
                if self.is_current(epoch) {
                    self.apply_channel(kind, event);
                }
                Vec::new()
            }
            Event::AnimationSettled { token } => {
                self.character.settle(token);
                Vec::new()
            }
        }
    }

    #[must_use]
    pub fn view(&self) -> ViewModel {
        let Some(identity) = &self.identity else {
            return ViewModel::Registration(RegistrationView {
                draft: self.form.draft.clone(),
                error: self.form.error.clone(),
                pending: self.form.pending,
            });
        };

        let c = &self.character;
        ViewModel::Game(GameView {
            username: identity.username().to_owned(),
            score: self.player.map(|p| p.score),
            position: self.player.map(|p| p.position),
            pose: Pose::resolve(c.is_eating, c.is_smiling, c.is_dragging),
            is_eating: c.is_eating,
            is_smiling: c.is_smiling,
            is_dragging: c.is_dragging,
            leaderboard_expanded: self.leaderboard_expanded,
            rows: display_rows(&self.leaderboard, identity.username(), self.player, self.leaderboard_expanded),
            user_channel: self.user_stream.status,
            leaderboard_channel: self.leaderboard_stream.status,
        })
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    fn handle_input(&mut self, input: Input) -> Vec<Effect> {
        let Some(username) = self.identity.as_ref().map(|i| i.username().to_owned()) else {
            return self.handle_registration_input(input);
        };

        match input {
            Input::CharacterClicked => {
                let token = self.token();
                self.character.clicked(token);
                self.interaction(username, ActionKind::Click, Cue::Click, token)
            }
            Input::DragStarted => {
                self.character.drag_started();
                Vec::new()
            }
            Input::DragEnded => {
                self.character.drag_ended();
                Vec::new()
            }
            Input::FoodDropped => {
                let token = self.token();
                self.character.fed(token);
                self.interaction(username, ActionKind::Feed, Cue::Eating, token)
            }
            Input::LeaderboardToggled => {
                self.leaderboard_expanded = !self.leaderboard_expanded;
                Vec::new()
            }
            Input::LoggedOut => {
                let mut effects = self.leave();
                effects.push(Effect::ClearIdentity);
                effects
            }
            Input::UsernameEdited(_) | Input::RegisterSubmitted => Vec::new(),
        }
    }

    fn handle_registration_input(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::UsernameEdited(text) => {
                self.form.edit(text);
                Vec::new()
            }
            Input::RegisterSubmitted => {
                if self.form.pending {
                    return Vec::new();
                }
                match Identity::parse(&self.form.draft) {
                    Ok(identity) => {
                        self.form.error = None;
                        self.form.pending = true;
                        vec![Effect::Register { username: identity.username().to_owned() }]
                    }
                    Err(e) => {
                        self.form.error = Some(e.to_string());
                        Vec::new()
                    }
                }
            }
            other => {
                debug!(input = ?other, "not authenticated, ignoring input");
                Vec::new()
            }
        }
    }

    fn interaction(&self, username: String, kind: ActionKind, cue: Cue, token: u64) -> Vec<Effect> {
        vec![
            Effect::PlayCue(cue),
            Effect::SendAction { username, kind },
            Effect::ScheduleSettle { token, after: self.animation },
        ]
    }

    fn token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    fn is_current(&self, epoch: u64) -> bool {
        if self.identity.is_some() && epoch == self.epoch {
            return true;
        }
        debug!(epoch, current = self.epoch, "dropping stale event");
        false
    }

    fn enter(&mut self, identity: Identity) -> Vec<Effect> {
        self.epoch += 1;
        self.reset_game();
        let username = identity.username().to_owned();
        self.identity = Some(identity);
        vec![
            Effect::OpenChannels { epoch: self.epoch, username: username.clone() },
            Effect::FetchSnapshot { epoch: self.epoch, username },
        ]
    }

    fn leave(&mut self) -> Vec<Effect> {
        self.epoch += 1;
        self.identity = None;
        self.reset_game();
        self.form = RegistrationForm::default();
        vec![Effect::CloseChannels]
    }

    fn reset_game(&mut self) {
        self.player = None;
        self.leaderboard.clear();
        self.user_stream = Stream::default();
        self.leaderboard_stream = Stream::default();
        self.character = CharacterFlags::default();
        self.leaderboard_expanded = false;
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.player = Some(snapshot.player);
        self.leaderboard = snapshot.leaderboard;
    }

    fn apply_channel(&mut self, kind: ChannelKind, event: ChannelEvent) {
        let stream = match kind {
            ChannelKind::User => &mut self.user_stream,
            ChannelKind::Leaderboard => &mut self.leaderboard_stream,
        };

        match event {
            ChannelEvent::Status(status) => {
                if status == ChannelStatus::Connecting {
                    stream.last_seq = None;
                }
                stream.status = status;
            }
            ChannelEvent::Score { seq, update } => {
                if kind == ChannelKind::User && stream.accept(seq) {
                    self.player = Some(update.into());
                } else {
                    debug!(?kind, ?seq, "dropping out-of-order score update");
                }
            }
            ChannelEvent::Leaderboard { seq, entries } => {
                if kind == ChannelKind::Leaderboard && stream.accept(seq) {
                    self.leaderboard = entries;
                } else {
                    debug!(?kind, ?seq, "dropping out-of-order leaderboard update");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
