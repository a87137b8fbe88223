//! In-process game server for tests.
//!
//! Implements the HTTP API and both live channels over axum, keeps players in
//! memory, and lets tests inject raw channel text or drop connections.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use frames::{ClickRequest, Envelope, LeaderboardEntry, RegisterRequest, ScoreUpdate, UserRecord};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::net::reconnect::ReconnectPolicy;

#[derive(Clone, Debug)]
enum Outbound {
    User { username: String, text: String },
    Board(String),
    Drop,
    DropBoard,
}

struct Shared {
    players: Mutex<Vec<(String, u64)>>,
    clicks: Mutex<Vec<ClickRequest>>,
    fail_clicks: AtomicBool,
    user_upgrades: AtomicUsize,
    board_upgrades: AtomicUsize,
    outbound: broadcast::Sender<Outbound>,
}

impl Shared {
    /// Players sorted by score, ties keep registration order.
    fn ranked(&self) -> Vec<(String, u64)> {
        let mut players = self.players.lock().expect("players lock").clone();
        players.sort_by(|a, b| b.1.cmp(&a.1));
        players
    }

    fn record(&self, username: &str) -> Option<UserRecord> {
        self.ranked()
            .iter()
            .enumerate()
            .find(|(_, (name, _))| name == username)
            .map(|(i, (_, score))| UserRecord {
                score: *score,
                position: u32::try_from(i + 1).expect("rank fits"),
            })
    }

    /// Leaderboard as the server reports it: no `position` field.
    fn board(&self) -> Vec<LeaderboardEntry> {
        self.ranked()
            .into_iter()
            .map(|(username, score)| LeaderboardEntry { username, score, position: None })
            .collect()
    }

    fn board_text(&self) -> String {
        frames::encode_envelope(&Envelope::leaderboard_update(&self.board()))
    }
}

type MockState = Arc<Shared>;

pub(crate) struct TestServer {
    addr: SocketAddr,
    shared: MockState,
    task: JoinHandle<()>,
}

impl TestServer {
    pub(crate) async fn start() -> Self {
        let (outbound, _) = broadcast::channel(64);
        let shared = Arc::new(Shared {
            players: Mutex::new(Vec::new()),
            clicks: Mutex::new(Vec::new()),
            fail_clicks: AtomicBool::new(false),
            user_upgrades: AtomicUsize::new(0),
            board_upgrades: AtomicUsize::new(0),
            outbound,
        });

        let app = Router::new()
            .route("/register", post(register))
            .route("/user/{username}", get(user))
            .route("/leaderboard", get(leaderboard))
            .route("/click", post(click))
            .route("/ws/user/{username}", get(ws_user))
            .route("/ws/leaderboard", get(ws_leaderboard))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("test server addr");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared, task }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client config pointed at this server with short timings.
    pub(crate) fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url())
            .expect("test server url")
            .with_animation(Duration::from_millis(40))
            .with_reconnect(ReconnectPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(20),
                max_delay: Duration::from_millis(80),
            })
    }

    pub(crate) fn seed(&self, username: &str, score: u64) {
        self.shared
            .players
            .lock()
            .expect("players lock")
            .push((username.to_owned(), score));
    }

    pub(crate) fn score_of(&self, username: &str) -> Option<u64> {
        self.shared.record(username).map(|r| r.score)
    }

    pub(crate) fn is_registered(&self, username: &str) -> bool {
        self.shared.record(username).is_some()
    }

    pub(crate) fn clicks(&self) -> Vec<ClickRequest> {
        self.shared.clicks.lock().expect("clicks lock").clone()
    }

    pub(crate) fn fail_clicks(&self, fail: bool) {
        self.shared.fail_clicks.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn user_upgrades(&self) -> usize {
        self.shared.user_upgrades.load(Ordering::SeqCst)
    }

    pub(crate) fn board_upgrades(&self) -> usize {
        self.shared.board_upgrades.load(Ordering::SeqCst)
    }

    /// Send raw text on `username`'s score channel.
    pub(crate) fn push_user(&self, username: &str, text: impl Into<String>) {
        let _ = self.shared.outbound.send(Outbound::User {
            username: username.to_owned(),
            text: text.into(),
        });
    }

    /// Send raw text on every leaderboard channel.
    pub(crate) fn push_board(&self, text: impl Into<String>) {
        let _ = self.shared.outbound.send(Outbound::Board(text.into()));
    }

    /// Close every open channel from the server side.
    pub(crate) fn drop_connections(&self) {
        let _ = self.shared.outbound.send(Outbound::Drop);
    }

    /// Close only the leaderboard channels.
    pub(crate) fn drop_leaderboard_connections(&self) {
        let _ = self.shared.outbound.send(Outbound::DropBoard);
    }

    /// Stop accepting connections and close the open ones.
    pub(crate) fn stop(&self) {
        self.task.abort();
        self.drop_connections();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// HTTP
// =============================================================================

fn detail(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "detail": text }))).into_response()
}

async fn register(State(shared): State<MockState>, Json(req): Json<RegisterRequest>) -> Response {
    let mut players = shared.players.lock().expect("players lock");
    if players.iter().any(|(name, _)| *name == req.username) {
        return detail(StatusCode::BAD_REQUEST, "Username already taken");
    }
    players.push((req.username, req.score));
    Json(json!({ "message": "User registered" })).into_response()
}

async fn user(State(shared): State<MockState>, Path(username): Path<String>) -> Response {
    match shared.record(&username) {
        Some(record) => Json(record).into_response(),
        None => detail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn leaderboard(State(shared): State<MockState>) -> Json<Vec<LeaderboardEntry>> {
    Json(shared.board())
}

async fn click(State(shared): State<MockState>, Json(req): Json<ClickRequest>) -> Response {
    if shared.fail_clicks.load(Ordering::SeqCst) {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "click failed");
    }
    {
        let mut players = shared.players.lock().expect("players lock");
        let Some(slot) = players.iter_mut().find(|(name, _)| *name == req.username) else {
            return detail(StatusCode::NOT_FOUND, "User not found");
        };
        slot.1 += if req.is_drag { 10 } else { 1 };
    }
    shared.clicks.lock().expect("clicks lock").push(req.clone());

    let record = shared.record(&req.username).expect("clicked player exists");
    let update = ScoreUpdate { new_score: record.score, position: record.position };
    let _ = shared.outbound.send(Outbound::User {
        username: req.username,
        text: frames::encode_envelope(&Envelope::score_update(&update)),
    });
    let _ = shared.outbound.send(Outbound::Board(shared.board_text()));

    Json(json!({ "new_score": record.score })).into_response()
}

// =============================================================================
// LIVE CHANNELS
// =============================================================================

async fn ws_user(
    State(shared): State<MockState>,
    Path(username): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    shared.user_upgrades.fetch_add(1, Ordering::SeqCst);
    // Subscribe before the handshake completes so nothing sent after the
    // client sees the channel open is missed.
    let rx = shared.outbound.subscribe();
    ws.on_upgrade(move |socket| pump(socket, rx, Some(username), None))
}

async fn ws_leaderboard(State(shared): State<MockState>, ws: WebSocketUpgrade) -> Response {
    shared.board_upgrades.fetch_add(1, Ordering::SeqCst);
    let rx = shared.outbound.subscribe();
    let initial = shared.board_text();
    ws.on_upgrade(move |socket| pump(socket, rx, None, Some(initial)))
}

async fn pump(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<Outbound>,
    user: Option<String>,
    initial: Option<String>,
) {
    if let Some(text) = initial {
        if socket.send(Message::Text(text.into())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            out = rx.recv() => {
                let text = match out {
                    Ok(Outbound::User { username, text }) if user.as_deref() == Some(username.as_str()) => text,
                    Ok(Outbound::Board(text)) if user.is_none() => text,
                    Ok(Outbound::DropBoard) if user.is_none() => {
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                    Ok(Outbound::Drop) => {
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}
