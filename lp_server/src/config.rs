//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use live_poker::table::TableConfig;
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Security configuration
    pub security: SecurityConfig,
    /// Settings for tables the provisioner knows nothing about
    pub table_defaults: TableConfig,
    /// Prometheus scrape address, exporter disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT verification secret (required)
    pub jwt_secret: String,
    /// Reject tokens without an `exp` claim
    pub require_exp: bool,
    /// Accept secrets shorter than 32 characters
    pub allow_weak_secret: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?.unwrap_or(default_bind()?),
        };

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use the secret your token issuer signs with".to_string(),
        })?;

        let security = SecurityConfig {
            jwt_secret,
            require_exp: parse_env_or("JWT_REQUIRE_EXP", true),
            allow_weak_secret: parse_env_or("ALLOW_WEAK_JWT_SECRET", false),
        };

        let defaults = TableConfig::default();
        let table_defaults = TableConfig {
            name: std::env::var("TABLE_NAME").unwrap_or(defaults.name),
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind),
            max_players: parse_env_or("TABLE_MAX_PLAYERS", defaults.max_players),
            starting_stack: parse_env_or("TABLE_STARTING_STACK", defaults.starting_stack),
            action_timeout_secs: parse_env_or(
                "TABLE_ACTION_TIMEOUT_SECS",
                defaults.action_timeout_secs,
            ),
            start_delay_secs: parse_env_or("TABLE_START_DELAY_SECS", defaults.start_delay_secs),
            fold_restart_secs: parse_env_or("TABLE_FOLD_RESTART_SECS", defaults.fold_restart_secs),
            showdown_restart_secs: parse_env_or(
                "TABLE_SHOWDOWN_RESTART_SECS",
                defaults.showdown_restart_secs,
            ),
            idle_timeout_secs: parse_env_or("TABLE_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
        };

        let metrics_bind = parse_env("METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            security,
            table_defaults,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.security.jwt_secret.len() < 32 && !self.security.allow_weak_secret {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (set ALLOW_WEAK_JWT_SECRET=true to override)"
                    .to_string(),
            });
        }

        self.table_defaults
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "TABLE_*".to_string(),
                reason,
            })?;

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> Result<SocketAddr, ConfigError> {
    DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
        var: "SERVER_BIND".to_string(),
        reason: format!("Default {DEFAULT_BIND} is not an address"),
    })
}

/// Parse an optional variable. Present but unparseable is an error.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Cannot parse {raw:?}"),
        }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
