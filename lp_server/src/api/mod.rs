//! HTTP/WebSocket API for the poker server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: CORS middleware
//! - **JWT**: Tokens are verified once, when the socket opens
//! - **Actor Model**: Table state managed by dedicated actor tasks
//!
//! # Endpoints Overview
//!
//! - `GET /?token=<jwt>` - Establish WebSocket connection
//! - `GET /ws?token=<jwt>` - Same, under an explicit path
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use lp_server::api::{AppState, create_router};
//! use live_poker::{SessionDirectory, TableManager, auth::JwtVerifier, table::TableConfig};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let state = AppState {
//!     table_manager: TableManager::with_defaults(TableConfig::default()),
//!     sessions: SessionDirectory::new(),
//!     verifier: Arc::new(JwtVerifier::new("a_shared_secret_of_at_least_32_chars", true)),
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use live_poker::{SessionDirectory, TableManager, auth::IdentityVerifier};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Every field is a cheap handle onto shared state, so cloning per request is fine.
#[derive(Clone)]
pub struct AppState {
    /// Registry of live tables
    pub table_manager: TableManager,
    /// Connected players and the tables they joined
    pub sessions: SessionDirectory,
    /// Checks the credential presented when a socket opens
    pub verifier: Arc<dyn IdentityVerifier>,
}

/// Create the API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health              - Health check (public)
/// GET  /?token=<jwt>        - WebSocket (token required)
/// GET  /ws?token=<jwt>      - WebSocket (token required)
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // WebSocket routes handle their own auth via query parameter
        .route("/", get(websocket::websocket_handler))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","tables":{"active_count":2},"connections":5,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let table_count = state.table_manager.active_table_count().await;
    let connections = state.sessions.len().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": {
            "active_count": table_count
        },
        "connections": connections,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
