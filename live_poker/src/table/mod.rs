//! Table module providing multi-table support with async actor model.
//!
//! This module implements:
//! - TableActor: Async actor owning a single table's state machine
//! - TableManager: Registry that lazily creates and routes to table actors
//! - Message-based communication with tokio channels
//! - Table configuration and provisioning
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! Joins, leaves, actions and timer firings are handled one at a time in
//! arrival order. Timers are spawned sleeps that post back into the same
//! inbox, so the table never races its own clock.
//!
//! ## Example
//!
//! ```no_run
//! use live_poker::table::{TableConfig, TableManager};
//!
//! # async fn demo() -> Result<(), String> {
//! let manager = TableManager::with_defaults(TableConfig::default());
//! let (tx, _rx) = tokio::sync::mpsc::channel(64);
//! manager
//!     .join_table(&"t1".to_string(), "u1".into(), "Ann".to_string(), tx)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod provision;

pub use actor::{TableActor, TableHandle};
pub use config::TableConfig;
pub use manager::TableManager;
pub use messages::{TableMessage, TableResponse, TableSnapshot};
pub use provision::{DefaultProvisioner, StaticProvisioner, TableProvisioner, TableSpec};
