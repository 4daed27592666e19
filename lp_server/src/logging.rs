//! Structured logging configuration.
//!
//! The library logs through the `log` facade. The subscriber installed here
//! picks those records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from the `RUST_LOG` env var, `info` when unset.
///
/// # Example
///
/// ```no_run
/// use lp_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // `try_init` also installs the `log` bridge.
    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("A global logger is already installed");
        return;
    }

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `player_id` - Player the event concerns, when known
/// * `table_id` - Table the event concerns, when known
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use lp_server::logging::log_security_event;
///
/// log_security_event(
///     "identity_mismatch",
///     Some("u1"),
///     Some("t1"),
///     "Message claimed to come from u2",
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    player_id: Option<&str>,
    table_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        player_id = player_id,
        table_id = table_id,
        "SECURITY: {}",
        message
    );
}
