//! Table manager for spawning and managing multiple table actors.

use super::{
    actor::{TableActor, TableHandle},
    config::TableConfig,
    messages::{TableMessage, TableResponse, TableSnapshot},
    provision::{DefaultProvisioner, TableProvisioner},
};
use crate::game::entities::{Action, PlayerId, TableId};
use crate::net::messages::MessageSender;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, oneshot};

/// Table manager for managing multiple table instances
#[derive(Clone)]
pub struct TableManager {
    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Source of per-table settings
    provisioner: Arc<dyn TableProvisioner>,

    /// Settings used for anything the provisioner leaves out
    defaults: TableConfig,
}

impl TableManager {
    /// Create a new table manager
    ///
    /// # Arguments
    ///
    /// * `defaults` - Settings for tables the provisioner knows nothing about
    /// * `provisioner` - Lookup for per-table settings
    ///
    /// # Returns
    ///
    /// * `TableManager` - New table manager instance
    pub fn new(defaults: TableConfig, provisioner: Arc<dyn TableProvisioner>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            provisioner,
            defaults,
        }
    }

    /// Manager where every table uses `defaults`
    pub fn with_defaults(defaults: TableConfig) -> Self {
        Self::new(defaults, Arc::new(DefaultProvisioner))
    }

    /// Get a live table handle
    ///
    /// # Arguments
    ///
    /// * `table_id` - Table ID
    ///
    /// # Returns
    ///
    /// * `Option<TableHandle>` - Table handle if the table is running
    pub async fn get_table(&self, table_id: &TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables
            .get(table_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Get a table handle, creating and spawning the table on first use
    pub async fn get_or_create(&self, table_id: &TableId) -> TableHandle {
        if let Some(handle) = self.get_table(table_id).await {
            return handle;
        }

        let config = match self.provisioner.provision(table_id).await {
            Some(spec) => spec.apply(&self.defaults),
            None => TableConfig {
                name: format!("Table {table_id}"),
                ..self.defaults.clone()
            },
        };

        let mut tables = self.tables.write().await;
        // Someone else may have created it while we were provisioning.
        if let Some(handle) = tables.get(table_id).filter(|h| !h.is_closed()) {
            return handle.clone();
        }

        let (actor, handle) = TableActor::new(table_id.clone(), config);
        tables.insert(table_id.clone(), handle.clone());
        metrics::gauge!("active_tables").set(tables.len() as f64);
        drop(tables);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned table {}", table_id);
        handle
    }

    /// Send a request to a table and wait for its reply. If the table shut
    /// down between lookup and send, it is recreated once.
    async fn request<T>(
        &self,
        table_id: &TableId,
        make: impl Fn(oneshot::Sender<T>) -> TableMessage,
    ) -> Result<T, String> {
        for _ in 0..2 {
            let handle = self.get_or_create(table_id).await;
            let (tx, rx) = oneshot::channel();
            if handle.send(make(tx)).await.is_err() {
                self.evict_closed().await;
                continue;
            }
            return rx
                .await
                .map_err(|_| "Failed to receive response".to_string());
        }
        Err(format!("Table {table_id} is unavailable"))
    }

    /// Join a table
    ///
    /// # Arguments
    ///
    /// * `table_id` - Table ID
    /// * `player_id` - Verified player identity
    /// * `name` - Display name
    /// * `sender` - The player's outbound queue
    ///
    /// # Returns
    ///
    /// * `Result<TableResponse, String>` - Response or error
    pub async fn join_table(
        &self,
        table_id: &TableId,
        player_id: PlayerId,
        name: String,
        sender: MessageSender,
    ) -> Result<TableResponse, String> {
        self.request(table_id, |response| TableMessage::Join {
            player_id: player_id.clone(),
            name: name.clone(),
            sender: sender.clone(),
            response,
        })
        .await
    }

    /// Leave a table
    pub async fn leave_table(
        &self,
        table_id: &TableId,
        player_id: PlayerId,
    ) -> Result<TableResponse, String> {
        // Leaving a table that isn't running is a no-op.
        let Some(handle) = self.get_table(table_id).await else {
            return Ok(TableResponse::Success);
        };
        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::Leave {
                player_id,
                response: tx,
            })
            .await
            .map_err(|e| format!("Failed to send message: {}", e))?;
        rx.await
            .map_err(|_| "Failed to receive response".to_string())
    }

    /// Submit a betting action
    pub async fn take_action(
        &self,
        table_id: &TableId,
        player_id: PlayerId,
        action: Action,
    ) -> Result<TableResponse, String> {
        self.request(table_id, |response| TableMessage::TakeAction {
            player_id: player_id.clone(),
            action,
            response,
        })
        .await
    }

    /// Get table state
    ///
    /// # Arguments
    ///
    /// * `table_id` - Table ID
    /// * `viewer` - Optional player for a personalized view
    ///
    /// # Returns
    ///
    /// * `Result<TableSnapshot, String>` - Table state or error
    pub async fn get_table_state(
        &self,
        table_id: &TableId,
        viewer: Option<PlayerId>,
    ) -> Result<TableSnapshot, String> {
        let handle = self
            .get_table(table_id)
            .await
            .ok_or_else(|| "Table not found".to_string())?;

        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::GetState {
                viewer,
                response: tx,
            })
            .await
            .map_err(|e| format!("Failed to send message: {}", e))?;

        rx.await
            .map_err(|_| "Failed to receive response".to_string())
    }

    /// Close a table
    pub async fn close_table(&self, table_id: &TableId) -> Result<(), String> {
        let handle = self.tables.write().await.remove(table_id);
        if let Some(handle) = handle {
            // Already stopped is fine.
            let _ = handle.send(TableMessage::Close).await;
            log::info!("Closed table {}", table_id);
        }
        Ok(())
    }

    /// Drop handles of tables whose actors have exited
    ///
    /// # Returns
    ///
    /// * `usize` - Number of handles removed
    pub async fn evict_closed(&self) -> usize {
        let mut tables = self.tables.write().await;
        let before = tables.len();
        tables.retain(|table_id, handle| {
            let open = !handle.is_closed();
            if !open {
                log::debug!("Evicting closed table {}", table_id);
            }
            open
        });
        metrics::gauge!("active_tables").set(tables.len() as f64);
        before - tables.len()
    }

    /// Get active table count
    pub async fn active_table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.values().filter(|handle| !handle.is_closed()).count()
    }
}
