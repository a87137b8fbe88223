//! Live push channels.
//!
//! DESIGN
//! ======
//! Each channel is one background task owning one WebSocket. The task reports
//! everything through a sink callback: status transitions and decoded pushes.
//! It never touches client state directly, so the caller decides whether an
//! event is still relevant.
//!
//! LIFECYCLE
//! =========
//! 1. `Connecting` → handshake
//! 2. `Open` → read loop; text messages decoded and forwarded
//! 3. Server close, read error, or failed handshake → `Closed`
//! 4. Backoff per [`ReconnectPolicy`], then back to 1, until the policy
//!    gives up
//! 5. `ChannelHandle::close` (or dropping the handle) sends a close frame and
//!    ends the task
//!
//! Malformed messages are logged and skipped; they never close the channel.

use frames::{LeaderboardEntry, Push, ScoreUpdate};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::net::reconnect::ReconnectPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Per-player score and rank.
    User,
    /// Global ranking.
    Leaderboard,
}

impl ChannelKind {
    /// Endpoint for this channel. `username` only matters for [`ChannelKind::User`].
    #[must_use]
    pub fn endpoint(self, config: &ClientConfig, username: &str) -> Url {
        match self {
            Self::User => config.ws_endpoint(&["ws", "user", username]),
            Self::Leaderboard => config.ws_endpoint(&["ws", "leaderboard"]),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelStatus {
    #[default]
    Closed,
    Connecting,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Status(ChannelStatus),
    Score { seq: Option<u64>, update: ScoreUpdate },
    Leaderboard { seq: Option<u64>, entries: Vec<LeaderboardEntry> },
}

/// Owner of a running channel task.
#[derive(Debug)]
pub struct ChannelHandle {
    kind: ChannelKind,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    /// True once the task has stopped, either closed or out of retries.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Close the socket and wait for the task to exit.
    pub async fn close(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!(kind = ?self.kind, error = %e, "channel task ended abnormally");
        }
    }
}

/// Start a channel task on `url`.
///
/// `sink` is called from the task for every status change and decoded push.
/// Dropping the returned handle also stops the task.
pub fn spawn_channel<F>(url: Url, kind: ChannelKind, policy: ReconnectPolicy, sink: F) -> ChannelHandle
where
    F: Fn(ChannelEvent) + Send + Sync + 'static,
{
    let (shutdown, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(channel_loop(url, kind, policy, sink, shutdown_rx));
    ChannelHandle { kind, shutdown, task }
}

// =============================================================================
// CONNECTION LOOP
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Shutdown,
    Dropped,
}

async fn channel_loop<F>(
    url: Url,
    kind: ChannelKind,
    policy: ReconnectPolicy,
    sink: F,
    mut shutdown: oneshot::Receiver<()>,
) where
    F: Fn(ChannelEvent),
{
    let mut failures: u32 = 0;

    loop {
        sink(ChannelEvent::Status(ChannelStatus::Connecting));

        let connected = tokio::select! {
            _ = &mut shutdown => {
                sink(ChannelEvent::Status(ChannelStatus::Closed));
                return;
            }
            result = connect_async(url.as_str()) => result,
        };

        let exit = match connected {
            Ok((stream, _)) => {
                failures = 0;
                info!(?kind, %url, "channel open");
                sink(ChannelEvent::Status(ChannelStatus::Open));
                pump(stream, kind, &sink, &mut shutdown).await
            }
            Err(e) => {
                warn!(?kind, %url, error = %e, "channel connect failed");
                Exit::Dropped
            }
        };

        sink(ChannelEvent::Status(ChannelStatus::Closed));
        if exit == Exit::Shutdown {
            return;
        }

        if !policy.is_enabled() {
            info!(?kind, "reconnect disabled, channel stays closed");
            return;
        }

        failures = failures.saturating_add(1);
        let Some(delay) = policy.delay_for(failures) else {
            warn!(?kind, attempts = failures, "channel gave up reconnecting");
            return;
        };
        debug!(?kind, attempt = failures, ?delay, "channel reconnecting");

        tokio::select! {
            _ = &mut shutdown => return,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

async fn pump<F>(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    kind: ChannelKind,
    sink: &F,
    shutdown: &mut oneshot::Receiver<()>,
) -> Exit
where
    F: Fn(ChannelEvent),
{
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            _ = &mut *shutdown => {
                let _ = write.send(Message::Close(None)).await;
                return Exit::Shutdown;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = decode_push(kind, text.as_str()) {
                        sink(event);
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!(?kind, "channel closed by server");
                    return Exit::Dropped;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(?kind, error = %e, "channel read failed");
                    return Exit::Dropped;
                }
            }
        }
    }
}

/// Decode one text message into an event for `kind`.
///
/// `None` for malformed text, unknown kinds, and pushes that belong to the
/// other channel.
pub(crate) fn decode_push(kind: ChannelKind, text: &str) -> Option<ChannelEvent> {
    let envelope = match frames::decode_envelope(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(?kind, error = %e, "dropping malformed channel message");
            return None;
        }
    };
    let seq = envelope.seq;

    match envelope.into_push() {
        Ok(Push::Score(update)) if kind == ChannelKind::User => Some(ChannelEvent::Score { seq, update }),
        Ok(Push::Leaderboard(entries)) if kind == ChannelKind::Leaderboard => {
            Some(ChannelEvent::Leaderboard { seq, entries })
        }
        Ok(Push::Unknown(message_kind)) => {
            debug!(?kind, %message_kind, "ignoring unknown message kind");
            None
        }
        Ok(_) => {
            debug!(?kind, "ignoring push meant for the other channel");
            None
        }
        Err(e) => {
            warn!(?kind, error = %e, "dropping malformed channel payload");
            None
        }
    }
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
