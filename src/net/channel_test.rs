use super::*;
use crate::net::test_server::TestServer;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn collect(
    server: &TestServer,
    kind: ChannelKind,
    username: &str,
) -> (ChannelHandle, mpsc::UnboundedReceiver<ChannelEvent>) {
    collect_with(server, kind, username, server.config().reconnect)
}

fn collect_with(
    server: &TestServer,
    kind: ChannelKind,
    username: &str,
    policy: ReconnectPolicy,
) -> (ChannelHandle, mpsc::UnboundedReceiver<ChannelEvent>) {
    let config = server.config();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = spawn_channel(kind.endpoint(&config, username), kind, policy, move |event| {
        let _ = tx.send(event);
    });
    (handle, rx)
}

async fn wait_finished(handle: &ChannelHandle) {
    timeout(Duration::from_secs(2), async {
        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("channel task should stop");
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("channel event timed out")
        .expect("channel sink dropped")
}

async fn wait_for_status(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>, status: ChannelStatus) {
    loop {
        if next_event(rx).await == ChannelEvent::Status(status) {
            return;
        }
    }
}

/// Next non-status event.
async fn next_push(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    loop {
        match next_event(rx).await {
            ChannelEvent::Status(_) => {}
            other => return other,
        }
    }
}

// =============================================================================
// decode_push
// =============================================================================

#[test]
fn decode_routes_pushes_to_matching_channel() {
    let score = r#"{"type":"score_update","data":{"new_score":5,"position":2},"seq":9}"#;
    assert_eq!(
        decode_push(ChannelKind::User, score),
        Some(ChannelEvent::Score { seq: Some(9), update: ScoreUpdate { new_score: 5, position: 2 } })
    );
    assert_eq!(decode_push(ChannelKind::Leaderboard, score), None);

    let board = r#"{"type":"leaderboard_update","data":[{"username":"a","score":1}]}"#;
    assert!(matches!(
        decode_push(ChannelKind::Leaderboard, board),
        Some(ChannelEvent::Leaderboard { seq: None, ref entries }) if entries.len() == 1
    ));
    assert_eq!(decode_push(ChannelKind::User, board), None);
}

#[test]
fn decode_drops_malformed_and_unknown() {
    assert_eq!(decode_push(ChannelKind::User, "not json"), None);
    assert_eq!(decode_push(ChannelKind::User, r#"{"type":"score_update","data":{"new_score":"x"}}"#), None);
    assert_eq!(decode_push(ChannelKind::User, r#"{"type":"chat","data":{}}"#), None);
}

#[test]
fn endpoints_follow_channel_kind() {
    let config = ClientConfig::new("http://localhost:6543").unwrap();
    assert_eq!(
        ChannelKind::User.endpoint(&config, "niko").as_str(),
        "ws://localhost:6543/ws/user/niko"
    );
    assert_eq!(
        ChannelKind::Leaderboard.endpoint(&config, "ignored").as_str(),
        "ws://localhost:6543/ws/leaderboard"
    );
}

// =============================================================================
// live
// =============================================================================

#[tokio::test]
async fn leaderboard_channel_delivers_initial_board() {
    let server = TestServer::start().await;
    server.seed("alpha", 9);
    server.seed("beta", 4);

    let (handle, mut rx) = collect(&server, ChannelKind::Leaderboard, "");
    assert_eq!(next_event(&mut rx).await, ChannelEvent::Status(ChannelStatus::Connecting));
    assert_eq!(next_event(&mut rx).await, ChannelEvent::Status(ChannelStatus::Open));

    let ChannelEvent::Leaderboard { entries, .. } = next_push(&mut rx).await else {
        panic!("expected leaderboard");
    };
    let names: Vec<_> = entries.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, ["alpha", "beta"]);

    server.push_board(r#"{"type":"leaderboard_update","data":[{"username":"beta","score":12,"position":1}],"seq":3}"#);
    let ChannelEvent::Leaderboard { seq, entries } = next_push(&mut rx).await else {
        panic!("expected leaderboard");
    };
    assert_eq!(seq, Some(3));
    assert_eq!(entries[0].position, Some(1));

    handle.close().await;
}

#[tokio::test]
async fn user_channel_skips_garbage_and_keeps_reading() {
    let server = TestServer::start().await;
    server.seed("niko", 0);

    let (handle, mut rx) = collect(&server, ChannelKind::User, "niko");
    wait_for_status(&mut rx, ChannelStatus::Open).await;

    server.push_user("niko", "{{{ not json");
    server.push_user("niko", r#"{"type":"mystery","data":1}"#);
    server.push_user("someone_else", r#"{"type":"score_update","data":{"new_score":99,"position":1}}"#);
    server.push_user("niko", r#"{"type":"score_update","data":{"new_score":3,"position":1}}"#);

    assert_eq!(
        next_push(&mut rx).await,
        ChannelEvent::Score { seq: None, update: ScoreUpdate { new_score: 3, position: 1 } }
    );
    handle.close().await;
}

#[tokio::test]
async fn reconnects_after_server_drop() {
    let server = TestServer::start().await;
    let (handle, mut rx) = collect(&server, ChannelKind::Leaderboard, "");
    wait_for_status(&mut rx, ChannelStatus::Open).await;

    server.drop_connections();
    wait_for_status(&mut rx, ChannelStatus::Closed).await;
    wait_for_status(&mut rx, ChannelStatus::Open).await;
    assert_eq!(server.board_upgrades(), 2);

    handle.close().await;
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let server = TestServer::start().await;
    let (handle, mut rx) = collect(&server, ChannelKind::User, "niko");
    wait_for_status(&mut rx, ChannelStatus::Open).await;

    server.stop();
    // One drop plus three failed retries, each ending in Closed.
    for _ in 0..4 {
        wait_for_status(&mut rx, ChannelStatus::Closed).await;
    }
    wait_finished(&handle).await;
    assert_eq!(server.user_upgrades(), 1);
}

#[tokio::test]
async fn disabled_policy_stays_closed_after_drop() {
    let server = TestServer::start().await;
    let (handle, mut rx) = collect_with(&server, ChannelKind::Leaderboard, "", ReconnectPolicy::disabled());
    wait_for_status(&mut rx, ChannelStatus::Open).await;

    server.drop_connections();
    wait_for_status(&mut rx, ChannelStatus::Closed).await;
    wait_finished(&handle).await;
    assert_eq!(server.board_upgrades(), 1);
    // The sink was dropped with the task.
    while let Some(event) = rx.recv().await {
        assert_ne!(event, ChannelEvent::Status(ChannelStatus::Connecting));
    }
}

#[tokio::test]
async fn close_ends_with_closed_status() {
    let server = TestServer::start().await;
    let (handle, mut rx) = collect(&server, ChannelKind::User, "niko");
    wait_for_status(&mut rx, ChannelStatus::Open).await;

    timeout(Duration::from_secs(2), handle.close()).await.expect("close completes");
    assert_eq!(next_event(&mut rx).await, ChannelEvent::Status(ChannelStatus::Closed));
    // The sink was dropped with the task.
    assert!(rx.recv().await.is_none());
}
