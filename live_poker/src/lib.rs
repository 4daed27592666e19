//! # Live Poker
//!
//! A real-time Texas Hold'em engine. Every table is an actor that owns its
//! state machine, and every seated player receives a personalized view of
//! the table after each change.
//!
//! ## Architecture
//!
//! A hand moves through these stages:
//!
//! - **Waiting**: fewer than two funded players, or a start is pending
//! - **PreFlop**: blinds posted, hole cards dealt
//! - **Flop/Turn/River**: community cards dealt, one betting round each
//! - **Showdown**: best hand takes the pot
//!
//! A hand also ends early when everyone but one player folds.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, hand evaluation, and the table state machine
//! - [`table`]: Table actors, their registry, and provisioning
//! - [`session`]: Connected-player directory
//! - [`auth`]: Access token verification
//! - [`net`]: Wire message types
//!
//! ## Example
//!
//! ```
//! use live_poker::{PokerTable, table::TableConfig};
//!
//! let mut table = PokerTable::new("t1".to_string(), TableConfig::default());
//! table.join("u1".into(), "Ann", None).unwrap();
//! assert_eq!(table.players().len(), 1);
//! ```

/// Access token verification.
pub mod auth;

/// Core game logic, entities, and state machine.
pub mod game;

/// Wire protocol messages.
pub mod net;

/// Connected-player directory.
pub mod session;

/// Table actors and registry.
pub mod table;

pub use game::{
    PokerTable, Stage, TableError,
    constants::{self, MAX_PLAYERS},
    entities::{self, Action, Card, Chips, PlayerId, TableId},
    functional,
};
pub use net::messages;
pub use session::SessionDirectory;
pub use table::{TableConfig, TableManager};
