//! Connection manager
//!
//! Owns the single transport connection: its state machine, the capped
//! reconnect policy, and subscription replay. All frame dispatch happens
//! synchronously inside the receive loop; the only asynchronous waits are
//! the transport connect and the backoff timer.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::Transport;
use crate::channel::ChannelKey;
use crate::config::Config;
use crate::error::{MarketDataError, Result};
use crate::message::{subscribe_frame, unsubscribe_frame};
use crate::registry::{Handler, HandlerId, Removal, SubscriptionRegistry};
use crate::router::MessageRouter;

/// Connection lifecycle state, exactly one active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ReconnectWaiting,
}

/// Delay before reconnect attempt `n` (1-indexed)
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base * attempt
}

/// Manages the single streaming connection and its subscriptions
pub struct ConnectionManager<T: Transport> {
    transport: T,
    registry: Arc<Mutex<SubscriptionRegistry>>,
    router: MessageRouter,
    state: ConnectionState,
    reconnect_attempts: u32,
    ws_endpoint: String,
    depth_subscription: String,
    reconnect_delay: Duration,
    max_reconnect_attempts: u32,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, registry: Arc<Mutex<SubscriptionRegistry>>, config: &Config) -> Self {
        let router = MessageRouter::new(registry.clone());
        Self {
            transport,
            registry,
            router,
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            ws_endpoint: config.ws_endpoint.clone(),
            depth_subscription: config.depth_subscription.clone(),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            max_reconnect_attempts: config.max_reconnect_attempts,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Open the connection and replay active subscriptions
    ///
    /// Idempotent: returns immediately when already connected or a connect
    /// is in flight. A failed attempt leaves the manager ready for a fresh
    /// `connect()`.
    pub async fn connect(&mut self) -> Result<()> {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        match self.transport.connect(&self.ws_endpoint).await {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                self.reconnect_attempts = 0;
                self.replay_subscriptions().await
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Emit one subscribe frame per distinct active channel key
    async fn replay_subscriptions(&mut self) -> Result<()> {
        let keys = self.registry.lock().await.active_keys();
        for key in keys {
            info!(channel = %key, "Subscribing");
            self.transport
                .send(subscribe_frame(&key, &self.depth_subscription))
                .await?;
        }
        Ok(())
    }

    /// Register a handler for a channel
    ///
    /// The registry is updated first, so the subscription survives any
    /// connect failure and is replayed on the next successful connect.
    /// When already connected the subscribe frame goes out immediately;
    /// otherwise a connect is triggered and the replay covers it.
    pub async fn subscribe(&mut self, key: ChannelKey, handler: Handler) -> HandlerId {
        let id = self.registry.lock().await.subscribe(key.clone(), handler);

        if self.state == ConnectionState::Connected {
            let frame = subscribe_frame(&key, &self.depth_subscription);
            if let Err(e) = self.transport.send(frame).await {
                warn!(channel = %key, error = %e, "Failed to send subscribe frame");
            }
        } else if let Err(e) = self.connect().await {
            warn!(
                channel = %key,
                error = %e,
                "Connect failed; subscription kept for replay"
            );
        }
        id
    }

    /// Remove one handler; the unsubscribe frame goes out only when the
    /// channel's last handler left
    pub async fn unsubscribe(&mut self, key: &ChannelKey, id: HandlerId) -> Removal {
        let removal = self.registry.lock().await.unsubscribe(key, id);
        if removal == Removal::ChannelRemoved {
            self.send_unsubscribe(key).await;
        }
        removal
    }

    /// Remove every handler for a channel and emit an unsubscribe frame
    /// unconditionally
    pub async fn unsubscribe_all(&mut self, key: &ChannelKey) -> Removal {
        let removal = self.registry.lock().await.unsubscribe_all(key);
        self.send_unsubscribe(key).await;
        removal
    }

    async fn send_unsubscribe(&mut self, key: &ChannelKey) {
        if self.state != ConnectionState::Connected {
            return;
        }
        if let Err(e) = self.transport.send(unsubscribe_frame(key)).await {
            warn!(channel = %key, error = %e, "Failed to send unsubscribe frame");
        }
    }

    /// Clear all subscriptions and close the transport
    ///
    /// The manager stays inert until the next `connect()`.
    pub async fn disconnect(&mut self) {
        self.registry.lock().await.clear();
        self.transport.close().await;
        self.state = ConnectionState::Disconnected;
        self.reconnect_attempts = 0;
        info!("Disconnected");
    }

    /// Receive loop: route frames until retries are exhausted
    pub async fn run(&mut self) -> Result<()> {
        if let Err(e) = self.connect().await {
            warn!(error = %e, "Initial connect failed");
            self.reconnect().await?;
        }

        loop {
            match self.transport.recv().await {
                Ok(Some(text)) => {
                    self.router.route(&text).await;
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "Connection lost");
                    self.reconnect().await?;
                }
            }
        }
    }

    /// Reconnect policy: attempt n waits `base * n`, capped attempts, then
    /// a fatal surfaced error with no further retries
    async fn reconnect(&mut self) -> Result<()> {
        while self.reconnect_attempts < self.max_reconnect_attempts {
            self.reconnect_attempts += 1;
            self.state = ConnectionState::ReconnectWaiting;

            let delay = backoff_delay(self.reconnect_attempts, self.reconnect_delay);
            warn!(
                attempt = self.reconnect_attempts,
                max_attempts = self.max_reconnect_attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting after delay"
            );
            sleep(delay).await;

            match self.connect().await {
                Ok(()) => {
                    info!("Reconnected");
                    return Ok(());
                }
                Err(e) => warn!(error = %e, "Reconnect attempt failed"),
            }
        }

        self.state = ConnectionState::Disconnected;
        error!("Max reconnection attempts reached, giving up");
        Err(MarketDataError::MaxReconnectAttemptsExceeded)
    }
}
