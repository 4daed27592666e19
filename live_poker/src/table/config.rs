//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    constants::{
        DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_FOLD_RESTART_SECS, DEFAULT_IDLE_TIMEOUT_SECS,
        DEFAULT_MAX_PLAYERS, DEFAULT_SHOWDOWN_RESTART_SECS, DEFAULT_SMALL_BLIND,
        DEFAULT_STARTING_STACK, DEFAULT_START_DELAY_SECS, MAX_PLAYERS,
    },
    entities::{Blinds, Chips},
};

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Small blind amount. The big blind is always twice this.
    pub small_blind: Chips,

    /// Maximum number of seats (default: 6, hard cap: 10)
    pub max_players: usize,

    /// Chips a player receives when first seated
    pub starting_stack: Chips,

    /// Seconds a player has to act before being folded
    pub action_timeout_secs: u64,

    /// Delay between enough players sitting down and the first deal
    pub start_delay_secs: u64,

    /// Delay before the next hand after everyone else folded
    pub fold_restart_secs: u64,

    /// Delay before the next hand after a showdown
    pub showdown_restart_secs: u64,

    /// An empty table shuts down after this long
    pub idle_timeout_secs: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            small_blind: DEFAULT_SMALL_BLIND,
            max_players: DEFAULT_MAX_PLAYERS,
            starting_stack: DEFAULT_STARTING_STACK,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            start_delay_secs: DEFAULT_START_DELAY_SECS,
            fold_restart_secs: DEFAULT_FOLD_RESTART_SECS,
            showdown_restart_secs: DEFAULT_SHOWDOWN_RESTART_SECS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.small_blind.checked_mul(2).is_none() {
            return Err("Small blind is too large".to_string());
        }

        if self.max_players < 2 || self.max_players > MAX_PLAYERS {
            return Err(format!("Max players must be between 2 and {MAX_PLAYERS}"));
        }

        if self.starting_stack == 0 {
            return Err("Starting stack must be positive".to_string());
        }

        if self.action_timeout_secs == 0 {
            return Err("Action timeout must be at least 1 second".to_string());
        }

        if self.idle_timeout_secs == 0 {
            return Err("Idle timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    #[must_use]
    pub fn blinds(&self) -> Blinds {
        Blinds::from_small(self.small_blind)
    }

    #[must_use]
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    #[must_use]
    pub fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delay_secs)
    }

    #[must_use]
    pub fn fold_restart(&self) -> Duration {
        Duration::from_secs(self.fold_restart_secs)
    }

    #[must_use]
    pub fn showdown_restart(&self) -> Duration {
        Duration::from_secs(self.showdown_restart_secs)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.blinds(), Blinds { small: 50, big: 100 });
        assert_eq!(config.max_players, 6);
        assert_eq!(config.action_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_small_blind_rejected() {
        let config = TableConfig {
            small_blind: 0,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seat_cap_enforced() {
        for max_players in [0, 1, MAX_PLAYERS + 1] {
            let config = TableConfig {
                max_players,
                ..TableConfig::default()
            };
            assert!(config.validate().is_err(), "{max_players} seats");
        }
        let config = TableConfig {
            max_players: MAX_PLAYERS,
            ..TableConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let config = TableConfig {
            action_timeout_secs: 0,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TableConfig {
            idle_timeout_secs: 0,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
