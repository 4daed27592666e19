use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::game::entities::{Action, Chips, GameView, PlayerId, PlayerSummary, TableId};

/// Per-connection outbound queue. Tables only ever `try_send` into it.
pub type MessageSender = mpsc::Sender<ServerMessage>;

/// Capacity of each connection's outbound queue.
pub const OUTBOX_CAPACITY: usize = 64;

/// Identifier that may arrive as a JSON string or a JSON number.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for PlayerId {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(s) => PlayerId::new(&s),
            WireId::Number(n) => PlayerId::new(&n.to_string()),
        }
    }
}

/// A message from a client. Frames look like
/// `{"type": "ACTION", "payload": {...}}`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    JoinTable(JoinPayload),
    Action(ActionPayload),
    LeaveTable(LeavePayload),
}

impl ClientMessage {
    #[must_use]
    pub fn table_id(&self) -> &TableId {
        match self {
            Self::JoinTable(p) => &p.table_id,
            Self::Action(p) => &p.table_id,
            Self::LeaveTable(p) => &p.table_id,
        }
    }

    /// The `userId` the client claims to be, if it sent one.
    #[must_use]
    pub fn claimed_user(&self) -> Option<PlayerId> {
        let id = match self {
            Self::JoinTable(p) => p.user_id.clone(),
            Self::Action(p) => p.user_id.clone(),
            Self::LeaveTable(p) => p.user_id.clone(),
        };
        id.map(PlayerId::from)
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JoinTable(p) => write!(f, "join {}", p.table_id),
            Self::Action(p) => write!(f, "{} at {}", Action::from(p.action), p.table_id),
            Self::LeaveTable(p) => write!(f, "leave {}", p.table_id),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub table_id: TableId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<WireId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    pub table_id: TableId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<WireId>,
    pub action: ActionData,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavePayload {
    pub table_id: TableId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<WireId>,
}

/// Betting action as it appears on the wire.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionData {
    Fold,
    #[serde(alias = "CHECK")]
    Call,
    Raise { amount: Chips },
}

impl From<ActionData> for Action {
    fn from(value: ActionData) -> Self {
        match value {
            ActionData::Fold => Action::Fold,
            ActionData::Call => Action::CallCheck,
            ActionData::Raise { amount } => Action::RaiseTo(amount),
        }
    }
}

/// Why a hand ended before a showdown.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameOverReason {
    /// Everyone else folded.
    Fold,
    /// Players left until one seat remained.
    Abandoned,
}

/// A message from the server to one client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Sent once the connection's credential has been accepted.
    Connected { player_id: PlayerId },
    PlayerJoined { player: PlayerSummary },
    PlayerLeft { player_id: PlayerId },
    GameStarting { delay_seconds: u64, message: String },
    TurnChange { player_id: PlayerId, time_left: u64 },
    GameState(GameView),
    GameOver {
        winner_id: PlayerId,
        amount: Chips,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<GameOverReason>,
        /// Winning hand at showdown.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hand: Option<String>,
    },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
