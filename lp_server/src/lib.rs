//! WebSocket server for live poker tables.
//!
//! The binary wires these pieces together; integration tests drive them
//! directly.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
