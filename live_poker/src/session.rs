//! Directory of connected players.
//!
//! Tables only reach players they have seated. Everything else addressed to
//! a single player (rejections, greetings) goes through the
//! [`SessionDirectory`], which also remembers which tables each connection
//! joined so a disconnect can leave all of them.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::{RwLock, mpsc::error::TrySendError};
use uuid::Uuid;

use crate::game::entities::{PlayerId, TableId};
use crate::net::messages::{MessageSender, ServerMessage};

/// Identifies one physical connection. A player reconnecting gets a new one.
pub type ConnectionId = Uuid;

#[derive(Debug)]
struct Session {
    connection_id: ConnectionId,
    sender: MessageSender,
    tables: HashSet<TableId>,
}

/// Player id → live connection index
#[derive(Clone, Debug, Default)]
pub struct SessionDirectory {
    sessions: Arc<RwLock<HashMap<PlayerId, Session>>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `player_id`, replacing any older one. Tables
    /// the old connection had joined carry over.
    ///
    /// # Returns
    ///
    /// * `ConnectionId` - Token to pass back to [`Self::unregister`]
    pub async fn register(&self, player_id: PlayerId, sender: MessageSender) -> ConnectionId {
        let connection_id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        let tables = match sessions.remove(&player_id) {
            Some(old) => {
                log::info!(
                    "Player {} reconnected, replacing connection {}",
                    player_id,
                    old.connection_id
                );
                let _ = old
                    .sender
                    .try_send(ServerMessage::error("Connected from another session"));
                old.tables
            }
            None => HashSet::new(),
        };
        sessions.insert(
            player_id,
            Session {
                connection_id,
                sender,
                tables,
            },
        );
        connection_id
    }

    /// Drop a connection. A connection that has already been replaced by a
    /// newer one leaves the directory untouched.
    ///
    /// # Returns
    ///
    /// * `Some(tables)` - Tables the connection had joined
    /// * `None` - The connection was stale or unknown
    pub async fn unregister(
        &self,
        player_id: &PlayerId,
        connection_id: ConnectionId,
    ) -> Option<HashSet<TableId>> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(player_id) {
            Some(session) if session.connection_id == connection_id => {
                sessions.remove(player_id).map(|s| s.tables)
            }
            _ => None,
        }
    }

    /// Remember that `player_id` sits at `table_id`.
    pub async fn track_table(&self, player_id: &PlayerId, table_id: &TableId) {
        if let Some(session) = self.sessions.write().await.get_mut(player_id) {
            session.tables.insert(table_id.clone());
        }
    }

    pub async fn untrack_table(&self, player_id: &PlayerId, table_id: &TableId) {
        if let Some(session) = self.sessions.write().await.get_mut(player_id) {
            session.tables.remove(table_id);
        }
    }

    /// Tables `player_id` currently sits at, sorted.
    pub async fn tables_of(&self, player_id: &PlayerId) -> Vec<TableId> {
        let sessions = self.sessions.read().await;
        let mut tables: Vec<TableId> = sessions
            .get(player_id)
            .map(|s| s.tables.iter().cloned().collect())
            .unwrap_or_default();
        tables.sort();
        tables
    }

    /// Deliver a message to one player without waiting.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the message was queued
    pub async fn send_to(&self, player_id: &PlayerId, message: ServerMessage) -> bool {
        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(player_id) else {
            return false;
        };
        match session.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Outbox for player {} is full, dropping message", player_id);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub async fn is_connected(&self, player_id: &PlayerId) -> bool {
        self.sessions.read().await.contains_key(player_id)
    }

    /// Number of connected players
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
