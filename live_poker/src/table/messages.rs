//! Table actor message types.

use serde::Serialize;
use tokio::sync::oneshot;

use crate::game::{
    Stage, TableError, TimerKind,
    entities::{Action, Chips, GameView, PlayerId, PlayerView, TableId},
};
use crate::net::messages::MessageSender;

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Take a seat, or re-attach a connection to an existing seat
    Join {
        player_id: PlayerId,
        name: String,
        sender: MessageSender,
        response: oneshot::Sender<TableResponse>,
    },

    /// Give up a seat
    Leave {
        player_id: PlayerId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Player action (fold, call/check, raise)
    TakeAction {
        player_id: PlayerId,
        action: Action,
        response: oneshot::Sender<TableResponse>,
    },

    /// Get current table state, personalized for `viewer` when seated
    GetState {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<TableSnapshot>,
    },

    /// Internal: a timer armed by the table fired
    Timer(TimerKind),

    /// Shut the table down
    Close,
}

/// Response from table operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableResponse {
    /// Operation succeeded
    Success,

    /// Operation refused, state unchanged
    Rejected(TableError),
}

impl TableResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(self, TableResponse::Success)
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Success => None,
            TableResponse::Rejected(error) => Some(error.to_string()),
        }
    }
}

impl<T> From<Result<T, TableError>> for TableResponse {
    fn from(result: Result<T, TableError>) -> Self {
        match result {
            Ok(_) => TableResponse::Success,
            Err(error) => TableResponse::Rejected(error),
        }
    }
}

/// Point-in-time summary of a table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    /// Table ID
    pub table_id: TableId,

    /// Table name
    pub name: String,

    /// Seated players, in seat order
    pub players: Vec<PlayerView>,

    /// Maximum players
    pub max_players: usize,

    /// Small blind
    pub small_blind: Chips,

    /// Big blind
    pub big_blind: Chips,

    /// Current pot size
    pub pot: Chips,

    /// Current hand stage
    pub stage: Stage,

    /// Is a hand in progress
    pub is_active: bool,

    /// Whose turn it is
    pub current_turn: Option<PlayerId>,

    /// Hands dealt since the table opened
    pub hands_played: u64,

    /// Chips on the table (pot plus every stack)
    pub chips_in_play: Chips,

    /// The requesting viewer's personalized view
    #[serde(skip)]
    pub view: GameView,
}
