//! Prometheus metrics for monitoring table and connection health.
//!
//! The library records `hands_played_total` and `active_tables` itself. This
//! module adds the gateway's connection counters and installs the exporter.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use lp_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connected();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// A connection passed the credential check.
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// A connection closed.
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// A table refused a client's request.
pub fn rejected_actions_total(reason: &str) {
    metrics::counter!("rejected_actions_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}
