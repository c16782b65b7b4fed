//! WebSocket connection management

mod manager;
mod transport;

pub use manager::{backoff_delay, ConnectionManager, ConnectionState};
pub use transport::{Transport, WsTransport};
