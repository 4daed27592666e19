//! Hold'em game engine.
//!
//! This module provides the per-table game logic:
//! - Cards, deck, players and the views sent to clients
//! - Five-card hand evaluation
//! - The betting-round state machine driven by join/leave/act/timer inputs

pub mod constants;
pub mod entities;
pub mod functional;
pub mod state_machine;
pub mod states;

pub use state_machine::{PokerTable, TableError, TimerKind, TimerRequest};
pub use states::Stage;
