//! Trait definitions for the exchange capabilities the engine depends on

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::errors::Result;
use super::types::{BalanceSnapshot, OrderAck, OrderRequest, TickerUpdate};

/// Authenticated trading surface of an exchange
///
/// Implementations sign requests transparently. Any failure (network,
/// authentication, a refused order) comes back as an error; a returned
/// [`OrderAck`] always means the exchange accepted the order.
#[async_trait]
pub trait TradingClient: Send + Sync {
    /// Available balance per currency
    async fn get_balances(&self) -> Result<BalanceSnapshot>;

    /// Contracts currently held short on a swap instrument, zero when flat
    async fn get_short_position(&self, inst_id: &str) -> Result<Decimal>;

    /// Submit one order
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck>;
}

/// Streaming market data transport
///
/// Opens a connection, subscribes to the ticker channel of every given
/// symbol with a single request, and returns the live session.
#[async_trait]
pub trait MarketDataTransport: Send + Sync {
    async fn open(&self, symbols: &[String]) -> Result<Box<dyn FeedSession>>;

    /// Decode one raw payload into ticker updates
    ///
    /// Messages without a data payload (acks, events) decode to an empty
    /// list. An error means the payload was not understood at all.
    fn decode(&self, raw: &str) -> Result<Vec<TickerUpdate>>;
}

/// One live streaming connection
#[async_trait]
pub trait FeedSession: Send {
    /// Next raw text payload
    ///
    /// Returns `Ok(None)` once the server has closed the stream. Errors mean
    /// the connection is unusable and must be re-opened.
    async fn next_message(&mut self) -> Result<Option<String>>;
}
