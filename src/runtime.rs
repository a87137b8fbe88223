//! Session runtime: owns the store and carries out its effects.
//!
//! DESIGN
//! ======
//! One task, one queue. User input, network results, channel pushes and
//! timer expiries all arrive as [`Event`]s on the same unbounded channel and
//! are applied in arrival order. Effects that do I/O are spawned as their own
//! tasks and report back through that queue, so the loop never waits on the
//! network.
//!
//! OUTPUTS
//! =======
//! - `watch::Receiver<ViewModel>`: latest view, published only when it changes
//! - `mpsc::UnboundedReceiver<Cue>`: one item per cue, for audio/visual feedback
//!
//! LIFECYCLE
//! =========
//! 1. `spawn` → resume a persisted identity if there is one
//! 2. Event loop until `SessionHandle::shutdown` or the handle is dropped
//! 3. Open channels are closed before the task exits

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::SnapshotError;
use crate::identity::IdentityStore;
use crate::net::action::ActionDispatcher;
use crate::net::channel::{ChannelHandle, ChannelKind, spawn_channel};
use crate::net::session::SessionClient;
use crate::state::{Cue, Effect, Event, Input, Store, ViewModel};

/// Caller's side of a running session.
pub struct SessionHandle {
    events: mpsc::UnboundedSender<Event>,
    view: watch::Receiver<ViewModel>,
    cues: mpsc::UnboundedReceiver<Cue>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Queue a user input. Returns `false` if the session has stopped.
    pub fn send(&self, input: Input) -> bool {
        self.events.send(Event::Input(input)).is_ok()
    }

    /// Subscribe to view updates.
    #[must_use]
    pub fn view(&self) -> watch::Receiver<ViewModel> {
        self.view.clone()
    }

    #[must_use]
    pub fn current(&self) -> ViewModel {
        self.view.borrow().clone()
    }

    /// Next cue, or `None` once the session has stopped.
    pub async fn next_cue(&mut self) -> Option<Cue> {
        self.cues.recv().await
    }

    /// Stop the event loop and wait for channels to close.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "session task ended abnormally");
        }
    }
}

/// Start a session for `config`, resuming from `identity` if it holds one.
///
/// Must be called from within a tokio runtime.
pub fn spawn(config: ClientConfig, identity: Arc<dyn IdentityStore>) -> SessionHandle {
    let http = reqwest::Client::new();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (cue_tx, cue_rx) = mpsc::unbounded_channel();

    let store = Store::new(config.animation);
    let (view_tx, view_rx) = watch::channel(store.view());

    let runtime = Runtime {
        store,
        session: SessionClient::new(http.clone(), config.clone(), identity),
        actions: ActionDispatcher::new(http, config.clone()),
        config,
        events: events_tx.clone(),
        view: view_tx,
        cues: cue_tx,
        channels: Vec::new(),
    };
    let task = tokio::spawn(runtime.run(events_rx, shutdown_rx));

    SessionHandle { events: events_tx, view: view_rx, cues: cue_rx, shutdown: shutdown_tx, task }
}

// =============================================================================
// EVENT LOOP
// =============================================================================

struct Runtime {
    store: Store,
    session: SessionClient,
    actions: ActionDispatcher,
    config: ClientConfig,
    events: mpsc::UnboundedSender<Event>,
    view: watch::Sender<ViewModel>,
    cues: mpsc::UnboundedSender<Cue>,
    channels: Vec<ChannelHandle>,
}

impl Runtime {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>, mut shutdown: oneshot::Receiver<()>) {
        if let Some(identity) = self.session.resume() {
            info!(username = %identity, "resuming session");
            self.dispatch(Event::Resumed(identity));
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
            }
        }

        for channel in self.channels.drain(..) {
            channel.close().await;
        }
        debug!("session stopped");
    }

    fn dispatch(&mut self, event: Event) {
        for effect in self.store.apply(event) {
            self.execute(effect);
        }

        let next = self.store.view();
        self.view.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Register { username } => {
                let session = self.session.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let event = match session.register(&username).await {
                        Ok(identity) => Event::Registered(identity),
                        Err(e) => {
                            warn!(%username, error = %e, "registration failed");
                            Event::RegistrationFailed { reason: e.to_string() }
                        }
                    };
                    let _ = events.send(event);
                });
            }
            Effect::FetchSnapshot { epoch, username } => {
                let session = self.session.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let event = match session.fetch_snapshot(&username).await {
                        Ok(snapshot) => Event::SnapshotLoaded { epoch, snapshot },
                        Err(SnapshotError::NotFound { .. }) => {
                            warn!(%username, "server does not know this player, signing out");
                            Event::IdentityRejected { epoch }
                        }
                        Err(SnapshotError::Server(e)) => {
                            warn!(%username, error = %e, "snapshot fetch failed");
                            Event::SnapshotFailed { epoch, reason: e.to_string() }
                        }
                    };
                    let _ = events.send(event);
                });
            }
            Effect::OpenChannels { epoch, username } => {
                self.close_channels();
                for kind in [ChannelKind::User, ChannelKind::Leaderboard] {
                    let events = self.events.clone();
                    let url = kind.endpoint(&self.config, &username);
                    self.channels.push(spawn_channel(url, kind, self.config.reconnect, move |event| {
                        let _ = events.send(Event::Channel { epoch, kind, event });
                    }));
                }
            }
            Effect::CloseChannels => self.close_channels(),
            Effect::ClearIdentity => self.session.forget(),
            Effect::SendAction { username, kind } => {
                self.actions.dispatch(username, kind);
            }
            Effect::PlayCue(cue) => {
                let _ = self.cues.send(cue);
            }
            Effect::ScheduleSettle { token, after } => {
                let events = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = events.send(Event::AnimationSettled { token });
                });
            }
        }
    }

    /// Close in the background; the loop does not wait for close frames.
    fn close_channels(&mut self) {
        for channel in self.channels.drain(..) {
            tokio::spawn(channel.close());
        }
    }
}

#[cfg(test)]
#[path = "runtime_test.rs"]
mod tests;
