//! Supervised market data feed
//!
//! Keeps one streaming session open, writes every decoded tick into the
//! [`PriceCache`], and on any disconnect waits for the backoff delay and
//! re-opens the session with the same subscription. It never gives up.

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

use super::backoff::{BackoffPolicy, ConstantBackoff};
use super::cache::PriceCache;
use crate::common::traits::{FeedSession, MarketDataTransport};
use crate::common::types::FeedStatus;

/// Streaming ticker feed writing into a price cache
#[derive(Debug)]
pub struct MarketDataFeed<T: MarketDataTransport> {
    transport: T,
    symbols: Vec<String>,
    cache: PriceCache,
    backoff: Box<dyn BackoffPolicy>,
    status_tx: Option<mpsc::Sender<FeedStatus>>,
}

impl<T: MarketDataTransport> MarketDataFeed<T> {
    /// Create a feed for the given symbols, reconnecting every 3 seconds
    pub fn new(transport: T, symbols: Vec<String>, cache: PriceCache) -> Self {
        Self {
            transport,
            symbols,
            cache,
            backoff: Box::new(ConstantBackoff::default()),
            status_tx: None,
        }
    }

    pub fn with_backoff(mut self, policy: impl BackoffPolicy + 'static) -> Self {
        self.backoff = Box::new(policy);
        self
    }

    /// Publish connection status changes on `tx`
    ///
    /// Events are dropped when the channel is full or closed.
    pub fn with_status_channel(mut self, tx: mpsc::Sender<FeedStatus>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Run the feed forever
    #[instrument(name = "market_feed", skip_all, fields(symbols = self.symbols.len()))]
    pub async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            match self.transport.open(&self.symbols).await {
                Ok(mut session) => {
                    info!("Market data session established");
                    attempt = 0;
                    self.backoff.reset();
                    self.publish(FeedStatus::Connected {
                        symbols: self.symbols.len(),
                    });

                    let reason = self.consume(session.as_mut()).await;
                    match &reason {
                        Some(reason) => warn!("Market data session failed: {}", reason),
                        None => info!("Market data stream closed by server"),
                    }
                    self.publish(FeedStatus::Disconnected(reason));
                }
                Err(e) => {
                    warn!("Failed to open market data session: {}", e);
                    self.publish(FeedStatus::Disconnected(Some(e.to_string())));
                }
            }

            attempt = attempt.saturating_add(1);
            let delay = self.backoff.delay(attempt);
            info!(attempt, "Reconnecting in {:?}", delay);
            self.publish(FeedStatus::Reconnecting { attempt, delay });
            tokio::time::sleep(delay).await;
        }
    }

    /// Read one session until it ends; returns the failure reason, if any
    async fn consume(&self, session: &mut dyn FeedSession) -> Option<String> {
        loop {
            match session.next_message().await {
                Ok(Some(raw)) => self.apply(&raw).await,
                Ok(None) => return None,
                Err(e) => return Some(e.to_string()),
            }
        }
    }

    async fn apply(&self, raw: &str) {
        let updates = match self.transport.decode(raw) {
            Ok(updates) => updates,
            Err(e) => {
                debug!("Ignoring undecodable message: {} - {}", e, raw);
                return;
            }
        };

        let now = Utc::now();
        for update in updates {
            trace!(symbol = %update.symbol, price = %update.last_price, "tick");
            self.cache.put(&update.symbol, update.last_price, now).await;
        }
    }

    fn publish(&self, status: FeedStatus) {
        if let Some(tx) = &self.status_tx {
            if let Err(e) = tx.try_send(status) {
                trace!("Feed status not delivered: {}", e);
            }
        }
    }
}
