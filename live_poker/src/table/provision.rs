//! Table provisioning.
//!
//! Tables are created the first time anything references their id. A
//! [`TableProvisioner`] may supply the parameters for that id; anything it
//! leaves out falls back to the manager's defaults.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::config::TableConfig;
use crate::game::entities::{Chips, TableId};

/// Parameters for one table as provided by the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub table_id: TableId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub small_blind: Option<Chips>,
    #[serde(default)]
    pub max_players: Option<usize>,
}

impl TableSpec {
    /// Overlay this spec on `defaults`. A spec that would produce an invalid
    /// table is ignored in favor of the defaults.
    #[must_use]
    pub fn apply(&self, defaults: &TableConfig) -> TableConfig {
        let config = TableConfig {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| format!("Table {}", self.table_id)),
            small_blind: self.small_blind.unwrap_or(defaults.small_blind),
            max_players: self.max_players.unwrap_or(defaults.max_players),
            ..defaults.clone()
        };
        match config.validate() {
            Ok(()) => config,
            Err(reason) => {
                log::warn!(
                    "Ignoring provisioned settings for table {}: {}",
                    self.table_id,
                    reason
                );
                TableConfig {
                    name: format!("Table {}", self.table_id),
                    ..defaults.clone()
                }
            }
        }
    }
}

/// Source of per-table parameters.
#[async_trait]
pub trait TableProvisioner: Send + Sync {
    /// Look up `table_id`. `None` means "use the defaults".
    async fn provision(&self, table_id: &TableId) -> Option<TableSpec>;
}

/// Every table gets the default settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvisioner;

#[async_trait]
impl TableProvisioner for DefaultProvisioner {
    async fn provision(&self, _table_id: &TableId) -> Option<TableSpec> {
        None
    }
}

/// Fixed set of known tables.
#[derive(Debug, Clone, Default)]
pub struct StaticProvisioner {
    specs: HashMap<TableId, TableSpec>,
}

impl StaticProvisioner {
    pub fn new(specs: impl IntoIterator<Item = TableSpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (spec.table_id.clone(), spec))
                .collect(),
        }
    }
}

#[async_trait]
impl TableProvisioner for StaticProvisioner {
    async fn provision(&self, table_id: &TableId) -> Option<TableSpec> {
        self.specs.get(table_id).cloned()
    }
}
