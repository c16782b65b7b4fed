//! perp-feed - Perpetual Futures Market Data Pipeline
//!
//! Connects to the LBank streaming API, keeps normalized order books for
//! the configured instruments, and logs the derived trading figures as
//! ticker updates arrive.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use perp_feed::channel::ChannelKey;
use perp_feed::config::Config;
use perp_feed::message::StreamMessage;
use perp_feed::orderbook::Orderbook;
use perp_feed::registry::SubscriptionRegistry;
use perp_feed::rest::SnapshotClient;
use perp_feed::risk;
use perp_feed::ws::{ConnectionManager, WsTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting perp-feed market data pipeline");

    // Load configuration
    let config = Config::load()?;
    info!(instruments = ?config.instruments, "Configuration loaded");

    // Bootstrap 24h snapshots before streaming starts
    let snapshots = SnapshotClient::new(config.rest_endpoint.clone());
    for instrument in &config.instruments {
        match snapshots.ticker(instrument).await {
            Ok(snapshot) => {
                let ticker = snapshot.normalize();
                info!(
                    instrument = %ticker.instrument,
                    last_price = ticker.last_price,
                    change_percent = ticker.price_change_percent,
                    "Snapshot loaded"
                );
            }
            Err(e) => warn!(instrument = %instrument, error = %e, "Snapshot fetch failed"),
        }
    }

    // Shared normalized order books, one per instrument
    let books: Arc<StdMutex<HashMap<String, Orderbook>>> =
        Arc::new(StdMutex::new(HashMap::new()));

    let registry = Arc::new(Mutex::new(SubscriptionRegistry::new()));
    let mut manager = ConnectionManager::new(WsTransport::new(), registry, &config);

    for instrument in &config.instruments {
        let depth_limit = config.depth_limit;
        let depth_books = books.clone();
        manager
            .subscribe(
                ChannelKey::depth(instrument),
                Box::new(move |msg| {
                    if let StreamMessage::Depth(update) = msg {
                        if let Ok(mut books) = depth_books.lock() {
                            let book = books
                                .entry(update.pair.clone())
                                .or_insert_with(|| Orderbook::new(&update.pair));
                            book.apply(update, depth_limit);
                        }
                    }
                }),
            )
            .await;

        manager
            .subscribe(
                ChannelKey::ticker(instrument),
                Box::new(move |msg| {
                    if let StreamMessage::Ticker(update) = msg {
                        let ticker = update.normalize();
                        let funding_rate = risk::funding_rate_heuristic(
                            ticker.price_change,
                            ticker.last_price,
                        );
                        info!(
                            instrument = %ticker.instrument,
                            last_price = ticker.last_price,
                            change_percent = ticker.price_change_percent,
                            funding_rate = funding_rate,
                            next_funding = %risk::next_funding_countdown(chrono::Utc::now()),
                            "Ticker"
                        );
                    }
                }),
            )
            .await;
    }

    // Run until the reconnect budget is exhausted
    manager.run().await?;

    Ok(())
}
