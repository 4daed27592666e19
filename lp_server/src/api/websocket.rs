//! WebSocket gateway for live tables.
//!
//! One socket carries a player's traffic for every table they sit at.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /?token=<jwt>` (or `/ws?token=<jwt>`)
//! 2. Server validates the token before upgrading; a bad token gets `401`
//! 3. The connection registers in the session directory and receives
//!    `CONNECTED`
//! 4. A writer task drains the connection's outbound queue into the socket
//! 5. The read loop forwards `JOIN_TABLE`, `ACTION` and `LEAVE_TABLE` to the
//!    table registry
//! 6. On disconnect the player leaves every table the connection joined
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8080/?token=eyJhbGc...');
//!
//! ws.send(JSON.stringify({
//!   type: "JOIN_TABLE",
//!   payload: { tableId: "t1", username: "Ann" }
//! }));
//!
//! ws.send(JSON.stringify({
//!   type: "ACTION",
//!   payload: { tableId: "t1", action: { type: "RAISE", amount: 120 } }
//! }));
//! ```

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use live_poker::{
    PlayerId, TableError, TableId,
    auth::Identity,
    constants::MAX_USER_INPUT_LENGTH,
    messages::{ClientMessage, MessageSender, OUTBOX_CAPACITY, ServerMessage},
    table::TableResponse,
};
use log::{debug, error, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc;

use super::AppState;
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Upgrade an HTTP connection to a player's WebSocket.
///
/// # Query Parameters
///
/// - `token`: JWT access token for authentication
///
/// # Response
///
/// On success, upgrades connection to WebSocket protocol (101 Switching Protocols).
/// On authentication failure, returns `401 Unauthorized`.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let token = query.token.unwrap_or_default();
    let identity = match state.verifier.verify(&token) {
        Ok(identity) => identity,
        Err(e) => {
            log_security_event("token_rejected", None, None, &e.to_string());
            return (StatusCode::UNAUTHORIZED, e.client_message()).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Handle an established WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, identity: Identity, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let player_id = identity.player_id.clone();

    let (outbox, mut outbox_rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);
    let connection_id = state
        .sessions
        .register(player_id.clone(), outbox.clone())
        .await;
    metrics::websocket_connected();
    info!("WebSocket connected: player={}", player_id);

    // Fresh queue, so this can't be full.
    let _ = outbox.try_send(ServerMessage::Connected {
        player_id: player_id.clone(),
    });

    // Spawn task to push everything queued for this player
    let send_task = tokio::spawn(async move {
        while let Some(message) = outbox_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive messages from client
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Dropping malformed message from {}: {}", player_id, e);
                        continue;
                    }
                };

                if let Some(claimed) = client_msg.claimed_user()
                    && claimed != player_id
                {
                    log_security_event(
                        "identity_mismatch",
                        Some(player_id.as_str()),
                        Some(client_msg.table_id().as_str()),
                        &format!("Message claimed to come from {}", claimed),
                    );
                    continue;
                }

                let table_id = client_msg.table_id();
                if table_id.trim().is_empty() || table_id.len() > MAX_USER_INPUT_LENGTH * 2 {
                    warn!("Dropping message from {} with bad table id", player_id);
                    continue;
                }

                debug!("Player {}: {}", player_id, client_msg);
                handle_client_message(client_msg, &identity, &outbox, &state).await;
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: player={}", player_id);
                break;
            }
            Err(e) => {
                warn!("WebSocket error for {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    metrics::websocket_disconnected();

    // A newer connection for the same player keeps the seats.
    match state.sessions.unregister(&player_id, connection_id).await {
        Some(tables) => {
            for table_id in tables {
                match state
                    .table_manager
                    .leave_table(&table_id, player_id.clone())
                    .await
                {
                    Ok(_) => info!(
                        "Player {} left table {} on disconnect",
                        player_id, table_id
                    ),
                    Err(e) => warn!(
                        "Failed to leave table {} for {} on disconnect: {}",
                        table_id, player_id, e
                    ),
                }
            }
        }
        None => debug!("Stale connection for {} closed", player_id),
    }

    info!("WebSocket disconnected: player={}", player_id);
}

/// Forward one client request to its table.
///
/// Successes need no reply; the table broadcasts the outcome. Rejections are
/// reported to this player alone.
async fn handle_client_message(
    msg: ClientMessage,
    identity: &Identity,
    outbox: &MessageSender,
    state: &AppState,
) {
    let player_id = identity.player_id.clone();

    match msg {
        ClientMessage::JoinTable(payload) => {
            let name = payload
                .username
                .unwrap_or_else(|| identity.display_name().to_string());
            let result = state
                .table_manager
                .join_table(&payload.table_id, player_id.clone(), name, outbox.clone())
                .await;
            if matches!(result, Ok(TableResponse::Success)) {
                state.sessions.track_table(&player_id, &payload.table_id).await;
            }
            report(result, &player_id, &payload.table_id, state).await;
        }

        ClientMessage::Action(payload) => {
            let result = state
                .table_manager
                .take_action(&payload.table_id, player_id.clone(), payload.action.into())
                .await;
            report(result, &player_id, &payload.table_id, state).await;
        }

        ClientMessage::LeaveTable(payload) => {
            let result = state
                .table_manager
                .leave_table(&payload.table_id, player_id.clone())
                .await;
            state
                .sessions
                .untrack_table(&player_id, &payload.table_id)
                .await;
            match result {
                // Leaving a table you aren't at changes nothing.
                Ok(TableResponse::Rejected(TableError::NotSeated)) => {}
                other => report(other, &player_id, &payload.table_id, state).await,
            }
        }
    }
}

/// Tell the player why their request was refused.
async fn report(
    result: Result<TableResponse, String>,
    player_id: &PlayerId,
    table_id: &TableId,
    state: &AppState,
) {
    match result {
        Ok(TableResponse::Success) => {}
        Ok(TableResponse::Rejected(TableError::TableFull)) => {
            // Full tables turn joiners away without a notice.
            info!("Player {} could not sit at full table {}", player_id, table_id);
        }
        Ok(TableResponse::Rejected(e)) => {
            let reason = e.to_string();
            metrics::rejected_actions_total(&reason);
            info!("Table {} rejected {}: {}", table_id, player_id, reason);
            state
                .sessions
                .send_to(player_id, ServerMessage::error(reason))
                .await;
        }
        Err(e) => {
            error!("Table {} unavailable for {}: {}", table_id, player_id, e);
            state
                .sessions
                .send_to(player_id, ServerMessage::error("Table unavailable"))
                .await;
        }
    }
}
