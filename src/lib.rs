//! SpreadArbitrage Library
//!
//! Spot/perpetual spread arbitrage on OKX: a self-healing ticker feed keeps
//! a price cache current, and a decision loop opens and closes hedges when
//! the spread crosses per-pair thresholds.

pub mod common;
pub mod config;
pub mod market;
pub mod okx;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{ClientError, Result};
pub use common::traits::{FeedSession, MarketDataTransport, TradingClient};
pub use common::types::{
    BalanceSnapshot, FeedStatus, OrderAck, OrderRequest, OrderType, PositionSide, PriceQuote,
    Side, TickerUpdate, TradeMode,
};
pub use config::types::{AppConfig, TradingPairConfig};
pub use market::{
    BackoffPolicy, ConstantBackoff, ExponentialBackoff, MarketDataFeed, PriceCache, PriceReader,
};
pub use okx::rest::OkxRestClient;
pub use okx::websocket::OkxWebSocketTransport;

// Strategy types
pub use strategy::{
    compute_spread, execute_legs, ExecutionError, HedgeAction, PairOutcome, PositionBook,
    PositionState, SkipReason, SpreadEngine,
};
