//! Subscription registry
//!
//! Owns the mapping from channel keys to their ordered handler lists. The
//! active key set is the source of truth replayed by the connection manager
//! after every reconnect, so a handler registered while disconnected is
//! never silently dropped.

use std::collections::HashMap;

use crate::channel::ChannelKey;
use crate::message::StreamMessage;

/// Callback invoked for every frame routed to a channel
pub type Handler = Box<dyn FnMut(&StreamMessage) + Send>;

/// Stable identity for a registered handler
///
/// Ids are arena-style and monotonically increasing; removal never reuses
/// them, so closure reference equality is never needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Outcome of an unsubscribe call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Handler removed, the channel stays active
    HandlerRemoved,
    /// Last handler removed, the channel left the active set
    ChannelRemoved,
    /// No matching channel or handler
    NotFound,
}

/// Registry of channel subscriptions
#[derive(Default)]
pub struct SubscriptionRegistry {
    channels: HashMap<ChannelKey, Vec<(HandlerId, Handler)>>,
    next_id: u64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to a channel, activating the key if needed
    ///
    /// Handlers are invoked in registration order. Duplicate registrations
    /// of equivalent closures yield duplicate invocations; deduplication is
    /// the caller's responsibility.
    pub fn subscribe(&mut self, key: ChannelKey, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.channels.entry(key).or_default().push((id, handler));
        id
    }

    /// Remove one handler; the channel is dropped with its last handler
    pub fn unsubscribe(&mut self, key: &ChannelKey, id: HandlerId) -> Removal {
        let Some(handlers) = self.channels.get_mut(key) else {
            return Removal::NotFound;
        };
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        if handlers.len() == before {
            return Removal::NotFound;
        }
        if handlers.is_empty() {
            self.channels.remove(key);
            Removal::ChannelRemoved
        } else {
            Removal::HandlerRemoved
        }
    }

    /// Remove all handlers for a channel
    pub fn unsubscribe_all(&mut self, key: &ChannelKey) -> Removal {
        match self.channels.remove(key) {
            Some(_) => Removal::ChannelRemoved,
            None => Removal::NotFound,
        }
    }

    /// Invoke every handler registered for a channel, in order
    ///
    /// Returns the number of handlers invoked; zero means the frame had no
    /// takers and the caller decides how to log the drop.
    pub fn dispatch(&mut self, key: &ChannelKey, message: &StreamMessage) -> usize {
        let Some(handlers) = self.channels.get_mut(key) else {
            return 0;
        };
        for (_, handler) in handlers.iter_mut() {
            handler(message);
        }
        handlers.len()
    }

    /// Keys currently holding at least one handler
    pub fn active_keys(&self) -> Vec<ChannelKey> {
        self.channels.keys().cloned().collect()
    }

    pub fn is_active(&self, key: &ChannelKey) -> bool {
        self.channels.contains_key(key)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Drop every subscription, used by disconnect
    pub fn clear(&mut self) {
        self.channels.clear();
    }
}
