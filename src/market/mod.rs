//! Market data: the live price cache and the feed that keeps it populated

pub mod backoff;
pub mod cache;
pub mod feed;

pub use backoff::{BackoffPolicy, ConstantBackoff, ExponentialBackoff};
pub use cache::{PriceCache, PriceReader};
pub use feed::MarketDataFeed;
