//! Table-wide limits and default timings.

use super::entities::Chips;

/// Hard seat cap. Ten seats draw at most 25 cards, so a 52-card deck can't
/// run dry during a hand.
pub const MAX_PLAYERS: usize = 10;

/// Seat cap used when a table is created without provisioning data.
pub const DEFAULT_MAX_PLAYERS: usize = 6;

pub const DEFAULT_SMALL_BLIND: Chips = 50;

/// Chips handed to a player the first time they sit at a table.
pub const DEFAULT_STARTING_STACK: Chips = 1000;

pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_START_DELAY_SECS: u64 = 5;
pub const DEFAULT_FOLD_RESTART_SECS: u64 = 5;
pub const DEFAULT_SHOWDOWN_RESTART_SECS: u64 = 8;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Display names and identifiers are clipped to this many characters.
pub const MAX_USER_INPUT_LENGTH: usize = 32;
