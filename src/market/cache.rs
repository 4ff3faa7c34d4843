//! Latest-price cache shared between the feed and the decision loop

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::types::PriceQuote;

type QuoteMap = Arc<RwLock<HashMap<String, PriceQuote>>>;

/// Write handle of the price cache, owned by the market data feed
///
/// Each symbol maps to one whole [`PriceQuote`] replaced under the lock, so
/// a reader can never see the price of one tick with the time of another.
#[derive(Debug, Default)]
pub struct PriceCache {
    quotes: QuoteMap,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the quote for a symbol
    pub async fn put(&self, symbol: &str, price: Decimal, observed_at: DateTime<Utc>) {
        let quote = PriceQuote::new(symbol, price, observed_at);
        self.quotes.write().await.insert(symbol.to_string(), quote);
    }

    /// Latest quote, or `None` if the symbol was never observed
    pub async fn get(&self, symbol: &str) -> Option<PriceQuote> {
        self.quotes.read().await.get(symbol).cloned()
    }

    /// Read-only handle for consumers
    pub fn reader(&self) -> PriceReader {
        PriceReader {
            quotes: self.quotes.clone(),
        }
    }
}

/// Read-only view of the price cache
#[derive(Debug, Clone)]
pub struct PriceReader {
    quotes: QuoteMap,
}

impl PriceReader {
    /// Latest quote, or `None` if the symbol was never observed
    pub async fn get(&self, symbol: &str) -> Option<PriceQuote> {
        self.quotes.read().await.get(symbol).cloned()
    }

    /// Quotes for two symbols taken under one read lock
    pub async fn get_pair(&self, a: &str, b: &str) -> (Option<PriceQuote>, Option<PriceQuote>) {
        let quotes = self.quotes.read().await;
        (quotes.get(a).cloned(), quotes.get(b).cloned())
    }

    /// Symbols observed so far
    pub async fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.quotes.read().await.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub async fn len(&self) -> usize {
        self.quotes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.quotes.read().await.is_empty()
    }
}
