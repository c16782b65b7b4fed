//! WebSocket transport
//!
//! Thin wrapper over a tokio-tungstenite connection. The trait exists so
//! the connection manager can be driven by a scripted transport in tests;
//! production code always uses [`WsTransport`].

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::error::{MarketDataError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streaming transport used by the connection manager
pub trait Transport: Send {
    /// Open the connection; any previous connection is discarded
    fn connect(&mut self, url: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Send one outbound text frame
    fn send(&mut self, frame: String) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Receive the next text frame; `Ok(None)` for non-data frames
    fn recv(&mut self) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Close the connection if open
    fn close(&mut self) -> impl std::future::Future<Output = ()> + Send;
}

/// Production transport over tokio-tungstenite
#[derive(Default)]
pub struct WsTransport {
    stream: Option<WsStream>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Transport for WsTransport {
    async fn connect(&mut self, url: &str) -> Result<()> {
        self.stream = None;
        info!(url = %url, "Connecting to streaming endpoint");

        let (ws_stream, response) = connect_async(url)
            .await
            .map_err(|e| MarketDataError::Connection(format!("Failed to connect: {}", e)))?;

        info!(status = ?response.status(), "WebSocket connected");
        self.stream = Some(ws_stream);
        Ok(())
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| MarketDataError::Connection("Not connected".to_string()))?;

        stream
            .send(Message::Text(frame))
            .await
            .map_err(|e| MarketDataError::Message(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| MarketDataError::Connection("Not connected".to_string()))?;

        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!(len = text.len(), "Received text frame");
                Ok(Some(text))
            }
            Some(Ok(Message::Binary(data))) => {
                Ok(Some(String::from_utf8_lossy(&data).to_string()))
            }
            Some(Ok(Message::Ping(data))) => {
                debug!("Received ping, sending pong");
                if let Some(stream) = self.stream.as_mut() {
                    let _ = stream.send(Message::Pong(data)).await;
                }
                Ok(None)
            }
            Some(Ok(Message::Pong(_))) => Ok(None),
            Some(Ok(Message::Close(frame))) => {
                warn!(frame = ?frame, "Received close frame");
                self.stream = None;
                Err(MarketDataError::Connection("Connection closed".to_string()))
            }
            Some(Ok(Message::Frame(_))) => Ok(None),
            Some(Err(e)) => {
                warn!(error = %e, "WebSocket error");
                self.stream = None;
                Err(MarketDataError::Message(e.to_string()))
            }
            None => {
                warn!("WebSocket stream ended");
                self.stream = None;
                Err(MarketDataError::Connection("Stream ended".to_string()))
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }
}
