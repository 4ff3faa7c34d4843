//! Venue-neutral types shared by the feed, the trading client and the engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Trade mode of an order: cash for spot, cross/isolated for margined instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeMode {
    Cash,
    Cross,
    Isolated,
}

impl std::fmt::Display for TradeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeMode::Cash => write!(f, "cash"),
            TradeMode::Cross => write!(f, "cross"),
            TradeMode::Isolated => write!(f, "isolated"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Market,
    Limit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
        }
    }
}

/// Long/short tag for margined instruments in long/short position mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionSide {
    Long,
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// Latest observed price for one instrument
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    /// Instrument symbol, e.g. `BTC-USDT` or `BTC-USDT-SWAP`
    pub symbol: String,
    /// Last traded price
    pub last_price: Decimal,
    /// Local time the tick was received
    pub observed_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<String>, last_price: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            last_price,
            observed_at,
        }
    }
}

/// A last-price tick decoded from the market data stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerUpdate {
    pub symbol: String,
    pub last_price: Decimal,
}

impl TickerUpdate {
    pub fn new(symbol: impl Into<String>, last_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            last_price,
        }
    }
}

/// A one-shot order instruction handed to a [`TradingClient`](super::traits::TradingClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub inst_id: String,
    pub trade_mode: TradeMode,
    pub side: Side,
    pub order_type: OrderType,
    pub size: Decimal,
    /// Limit price, ignored for market orders
    pub price: Option<Decimal>,
    pub reduce_only: bool,
    pub position_side: Option<PositionSide>,
}

impl OrderRequest {
    /// Market order on a spot instrument
    pub fn spot_market(inst_id: impl Into<String>, side: Side, size: Decimal) -> Self {
        Self {
            inst_id: inst_id.into(),
            trade_mode: TradeMode::Cash,
            side,
            order_type: OrderType::Market,
            size,
            price: None,
            reduce_only: false,
            position_side: None,
        }
    }

    /// Cross-margin market order on the short side of a derivative
    pub fn short_market(inst_id: impl Into<String>, side: Side, size: Decimal) -> Self {
        Self {
            inst_id: inst_id.into(),
            trade_mode: TradeMode::Cross,
            side,
            order_type: OrderType::Market,
            size,
            price: None,
            reduce_only: false,
            position_side: Some(PositionSide::Short),
        }
    }

    /// Set a limit price and switch the order type to limit
    pub fn with_limit_price(mut self, price: Decimal) -> Self {
        self.order_type = OrderType::Limit;
        self.price = Some(price);
        self
    }

    pub fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }
}

impl std::fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} ({})",
            self.order_type, self.side, self.size, self.inst_id, self.trade_mode
        )?;
        if let Some(pos_side) = self.position_side {
            write!(f, " posSide={}", pos_side)?;
        }
        Ok(())
    }
}

/// Exchange acknowledgement of a submitted order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: Option<String>,
    /// Per-order status code, "0" on success
    pub code: String,
    pub message: String,
}

impl OrderAck {
    pub fn is_success(&self) -> bool {
        self.code == "0"
    }
}

/// Available balance per currency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSnapshot {
    balances: HashMap<String, Decimal>,
}

impl BalanceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the available balance of a currency
    pub fn insert(&mut self, currency: impl Into<String>, available: Decimal) {
        self.balances.insert(currency.into(), available);
    }

    /// Available balance for a currency; currencies not in the snapshot read as zero
    pub fn available(&self, currency: &str) -> Decimal {
        self.balances.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.balances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl FromIterator<(String, Decimal)> for BalanceSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

/// Connection status of the market data feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Connected and subscription sent
    Connected { symbols: usize },
    /// Session ended (with optional reason)
    Disconnected(Option<String>),
    /// Waiting before the next connection attempt
    Reconnecting { attempt: u32, delay: Duration },
}
