//! Configuration module - file, environment and pair list loading

pub mod loader;
pub mod types;

pub use loader::{load_config, load_trading_pairs, validate};
pub use types::{ApiCredentials, AppConfig, AppSettings, OkxConfig, TradingPairConfig};
