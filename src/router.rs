//! Message router
//!
//! Parses inbound frames into typed messages and dispatches them to the
//! handlers registered for the derived channel key. Dispatch is synchronous
//! and ordered; frames are never buffered or coalesced.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::message::StreamMessage;
use crate::registry::SubscriptionRegistry;

/// Outcome of routing a single raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Frame delivered to this many handlers
    Delivered(usize),
    /// Parsed fine but no handler is registered for the channel
    NoHandlers,
    /// Frame could not be parsed and was dropped
    Unparseable,
}

/// Routes inbound frames to registered handlers
pub struct MessageRouter {
    registry: Arc<Mutex<SubscriptionRegistry>>,
}

impl MessageRouter {
    pub fn new(registry: Arc<Mutex<SubscriptionRegistry>>) -> Self {
        Self { registry }
    }

    /// Route one raw frame
    ///
    /// Malformed frames are logged and dropped, never surfaced to callers.
    /// Unknown-channel deliveries are a no-op logged at debug level.
    pub async fn route(&self, raw: &str) -> Routed {
        let message = match StreamMessage::parse(raw) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, len = raw.len(), "Dropping unparseable frame");
                return Routed::Unparseable;
            }
        };

        let key = message.channel_key();
        let delivered = self.registry.lock().await.dispatch(&key, &message);
        if delivered == 0 {
            debug!(channel = %key, "No handlers registered for frame");
            return Routed::NoHandlers;
        }
        Routed::Delivered(delivered)
    }
}
