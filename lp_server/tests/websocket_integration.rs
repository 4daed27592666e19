//! WebSocket integration tests for real-time poker gameplay.
//!
//! Each test starts the router on a random local port and talks to it with
//! a real WebSocket client.

use futures_util::{SinkExt, StreamExt};
use live_poker::{
    PlayerId, SessionDirectory, TableManager,
    auth::{AccessTokenClaims, JwtVerifier, sign_access_token},
    messages::WireId,
    table::TableConfig,
};
use lp_server::api::{AppState, create_router};
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, Message},
};

const SECRET: &str = "integration_secret_that_is_long_enough";

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper to start a server, returning its address and registry
async fn start_server() -> (SocketAddr, TableManager) {
    let config = TableConfig {
        start_delay_secs: 1,
        ..TableConfig::default()
    };
    let table_manager = TableManager::with_defaults(config);
    let state = AppState {
        table_manager: table_manager.clone(),
        sessions: SessionDirectory::new(),
        verifier: Arc::new(JwtVerifier::new(SECRET, true)),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    (addr, table_manager)
}

fn token_for(user: &str) -> String {
    let claims = AccessTokenClaims {
        user_id: WireId::Text(user.to_string()),
        username: Some(user.to_uppercase()),
        exp: Some(chrono::Utc::now().timestamp() + 3600),
        iat: None,
    };
    sign_access_token(SECRET, &claims).unwrap()
}

/// Connect as `user` and consume the greeting
async fn connect(addr: SocketAddr, user: &str) -> Client {
    let url = format!("ws://{}/?token={}", addr, token_for(user));
    let (mut ws, _) = connect_async(url).await.unwrap();
    let hello = next_json(&mut ws).await;
    assert_eq!(hello["type"], "CONNECTED");
    assert_eq!(hello["playerId"], user);
    ws
}

async fn send(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip messages until one of `kind` arrives
async fn wait_for(ws: &mut Client, kind: &str) -> Value {
    loop {
        let msg = next_json(ws).await;
        if msg["type"] == kind {
            return msg;
        }
    }
}

/// Nothing but state noise arrives for a short while
async fn assert_no(ws: &mut Client, kind: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(300);
    while let Ok(Some(Ok(msg))) = tokio::time::timeout_at(deadline, ws.next()).await {
        if let Message::Text(text) = msg {
            let value: Value = serde_json::from_str(text.as_str()).unwrap();
            assert_ne!(value["type"], kind, "unexpected {value}");
        }
    }
}

fn join(table: &str) -> Value {
    json!({"type": "JOIN_TABLE", "payload": {"tableId": table}})
}

fn action(table: &str, action: Value) -> Value {
    json!({"type": "ACTION", "payload": {"tableId": table, "action": action}})
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_token_is_refused() {
    let (addr, _) = start_server().await;

    for url in [
        format!("ws://{}/?token=not-a-jwt", addr),
        format!("ws://{}/ws", addr),
    ] {
        match connect_async(url).await {
            Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
            other => panic!("expected 401, got {:?}", other.map(|(_, r)| r.status())),
        }
    }
}

#[tokio::test]
async fn test_connect_on_ws_path() {
    let (addr, _) = start_server().await;
    let url = format!("ws://{}/ws?token={}", addr, token_for("alice"));
    let (mut ws, _) = connect_async(url).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "CONNECTED");
}

// ============================================================================
// Game Flow Tests
// ============================================================================

#[tokio::test]
async fn test_two_players_join_and_hand_starts() {
    let (addr, _) = start_server().await;
    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;

    send(&mut alice, join("t1")).await;
    let joined = wait_for(&mut alice, "PLAYER_JOINED").await;
    assert_eq!(joined["player"]["id"], "alice");
    assert_eq!(joined["player"]["name"], "ALICE");

    send(&mut bob, join("t1")).await;
    let starting = wait_for(&mut alice, "GAME_STARTING").await;
    assert_eq!(starting["delaySeconds"], 1);

    let turn = wait_for(&mut bob, "TURN_CHANGE").await;
    assert_eq!(turn["playerId"], "alice");
    assert_eq!(turn["timeLeft"], 30);

    let state = wait_for(&mut bob, "GAME_STATE").await;
    assert_eq!(state["isActive"], true);
    assert_eq!(state["pot"], 150);
    assert_eq!(state["stage"], "pre-flop");
    assert_eq!(state["myHand"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_out_of_turn_action_errors_only_to_sender() {
    let (addr, _) = start_server().await;
    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    send(&mut alice, join("t1")).await;
    wait_for(&mut alice, "PLAYER_JOINED").await;
    send(&mut bob, join("t1")).await;
    wait_for(&mut alice, "TURN_CHANGE").await;
    wait_for(&mut bob, "TURN_CHANGE").await;

    // Alice acts first heads-up.
    send(&mut bob, action("t1", json!({"type": "RAISE", "amount": 500}))).await;
    let error = wait_for(&mut bob, "ERROR").await;
    assert_eq!(error["message"], "not your turn");
    assert_no(&mut alice, "ERROR").await;
}

#[tokio::test]
async fn test_fold_ends_hand() {
    let (addr, _) = start_server().await;
    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    send(&mut alice, join("t1")).await;
    wait_for(&mut alice, "PLAYER_JOINED").await;
    send(&mut bob, join("t1")).await;
    wait_for(&mut alice, "TURN_CHANGE").await;

    send(&mut alice, action("t1", json!({"type": "FOLD"}))).await;
    let over = wait_for(&mut bob, "GAME_OVER").await;
    assert_eq!(over["winnerId"], "bob");
    assert_eq!(over["amount"], 150);
    assert_eq!(over["reason"], "Fold");
}

#[tokio::test]
async fn test_check_is_call() {
    let (addr, manager) = start_server().await;
    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    send(&mut alice, join("t1")).await;
    wait_for(&mut alice, "PLAYER_JOINED").await;
    send(&mut bob, join("t1")).await;
    wait_for(&mut alice, "TURN_CHANGE").await;

    send(&mut alice, action("t1", json!({"type": "CHECK"}))).await;
    // The big blind gets the option.
    loop {
        let turn = wait_for(&mut bob, "TURN_CHANGE").await;
        if turn["playerId"] == "bob" {
            break;
        }
    }

    let snap = manager
        .get_table_state(&"t1".to_string(), None)
        .await
        .unwrap();
    assert_eq!(snap.pot, 200);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_message_is_dropped() {
    let (addr, manager) = start_server().await;
    let mut alice = connect(addr, "alice").await;

    ws_send_raw(&mut alice, "{not json").await;
    ws_send_raw(&mut alice, r#"{"type":"SHUFFLE","payload":{}}"#).await;
    send(&mut alice, join("t1")).await;

    wait_for(&mut alice, "PLAYER_JOINED").await;
    let snap = manager
        .get_table_state(&"t1".to_string(), None)
        .await
        .unwrap();
    assert_eq!(snap.players.len(), 1);
}

#[tokio::test]
async fn test_claimed_identity_must_match_token() {
    let (addr, manager) = start_server().await;
    let mut alice = connect(addr, "alice").await;

    send(
        &mut alice,
        json!({"type": "JOIN_TABLE", "payload": {"tableId": "t1", "userId": "mallory"}}),
    )
    .await;
    assert_no(&mut alice, "PLAYER_JOINED").await;
    assert!(manager.get_table(&"t1".to_string()).await.is_none());

    // A matching claim is fine.
    send(
        &mut alice,
        json!({"type": "JOIN_TABLE", "payload": {"tableId": "t1", "userId": "alice"}}),
    )
    .await;
    wait_for(&mut alice, "PLAYER_JOINED").await;
}

#[tokio::test]
async fn test_full_table_turns_joiner_away_silently() {
    let (addr, manager) = start_server().await;
    let mut clients = Vec::new();
    for i in 0..6 {
        let mut ws = connect(addr, &format!("p{i}")).await;
        send(&mut ws, join("t1")).await;
        wait_for(&mut ws, "PLAYER_JOINED").await;
        clients.push(ws);
    }

    let mut late = connect(addr, "late").await;
    send(&mut late, join("t1")).await;
    assert_no(&mut late, "ERROR").await;
    let snap = manager
        .get_table_state(&"t1".to_string(), None)
        .await
        .unwrap();
    assert_eq!(snap.players.len(), 6);
    assert!(!snap.players.iter().any(|p| p.id == PlayerId::from("late")));
}

// ============================================================================
// Disconnect Tests
// ============================================================================

#[tokio::test]
async fn test_disconnect_leaves_table() {
    let (addr, _) = start_server().await;
    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    send(&mut alice, join("t1")).await;
    wait_for(&mut alice, "PLAYER_JOINED").await;
    send(&mut bob, join("t1")).await;
    wait_for(&mut alice, "PLAYER_JOINED").await;
    wait_for(&mut bob, "PLAYER_JOINED").await;

    alice.close(None).await.unwrap();
    let left = wait_for(&mut bob, "PLAYER_LEFT").await;
    assert_eq!(left["playerId"], "alice");
}

#[tokio::test]
async fn test_leave_message_leaves_table() {
    let (addr, _) = start_server().await;
    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    send(&mut alice, join("t1")).await;
    wait_for(&mut alice, "PLAYER_JOINED").await;
    send(&mut bob, join("t1")).await;
    wait_for(&mut alice, "PLAYER_JOINED").await;

    send(
        &mut alice,
        json!({"type": "LEAVE_TABLE", "payload": {"tableId": "t1"}}),
    )
    .await;
    let left = wait_for(&mut bob, "PLAYER_LEFT").await;
    assert_eq!(left["playerId"], "alice");
}

#[tokio::test]
async fn test_reconnect_replaces_old_connection() {
    let (addr, manager) = start_server().await;
    let mut old = connect(addr, "alice").await;
    send(&mut old, join("t1")).await;
    wait_for(&mut old, "PLAYER_JOINED").await;

    let mut fresh = connect(addr, "alice").await;
    let notice = wait_for(&mut old, "ERROR").await;
    assert_eq!(notice["message"], "Connected from another session");

    // Closing the replaced socket keeps the seat.
    old.close(None).await.unwrap();
    send(&mut fresh, join("t1")).await;
    wait_for(&mut fresh, "GAME_STATE").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let snap = manager
        .get_table_state(&"t1".to_string(), None)
        .await
        .unwrap();
    assert_eq!(snap.players.len(), 1);
}

async fn ws_send_raw(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}
