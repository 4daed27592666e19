//! Wire protocol shared by the server and its clients.
//!
//! Frames are JSON text. Inbound frames carry a `type` tag and a `payload`;
//! outbound frames are flat objects tagged by `type`.

/// Client and server message types.
pub mod messages;

pub use messages::{ClientMessage, MessageSender, OUTBOX_CAPACITY, ServerMessage};
