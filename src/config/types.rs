//! Configuration types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OKX-specific configuration
    #[serde(default)]
    pub okx: OkxConfig,
    /// Spot/swap pairs to trade
    #[serde(default)]
    pub pairs: Vec<TradingPairConfig>,
    /// Optional path to a `TradingPairs.json` file, appended to `pairs`
    #[serde(default)]
    pub pairs_file: Option<String>,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// All instrument symbols the feed must subscribe to, spot legs first, without duplicates
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::with_capacity(self.pairs.len() * 2);
        let legs = self
            .pairs
            .iter()
            .map(|p| &p.spot)
            .chain(self.pairs.iter().map(|p| &p.swap));
        for symbol in legs {
            if !symbols.contains(symbol) {
                symbols.push(symbol.clone());
            }
        }
        symbols
    }
}

/// OKX platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkxConfig {
    /// API key for authenticated requests
    #[serde(default, alias = "ApiKey")]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default, alias = "SecretKey")]
    pub secret_key: Option<String>,
    /// API passphrase
    #[serde(default, alias = "Passphrase")]
    pub passphrase: Option<String>,
    /// Trade against the demo (simulated) environment
    #[serde(default, alias = "IsSimulated")]
    pub simulated: bool,
    /// Optional HTTP(S) proxy for REST requests
    #[serde(default, alias = "ProxyUrl")]
    pub proxy_url: Option<String>,
    /// Base URL for the REST API (same host for live and demo)
    #[serde(default = "default_okx_rest_url")]
    pub rest_url: String,
    /// Public WebSocket URL for live trading
    #[serde(default = "default_okx_ws_url")]
    pub ws_url: String,
    /// Public WebSocket URL for demo trading
    #[serde(default = "default_okx_ws_simulated_url")]
    pub ws_simulated_url: String,
}

impl OkxConfig {
    /// WebSocket endpoint matching the live/simulated flag
    pub fn websocket_url(&self) -> &str {
        if self.simulated {
            &self.ws_simulated_url
        } else {
            &self.ws_url
        }
    }

    /// Credentials, if all three parts are configured
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.secret_key, &self.passphrase) {
            (Some(key), Some(secret), Some(passphrase)) => Some(ApiCredentials::new(
                key.clone(),
                secret.clone(),
                passphrase.clone(),
            )),
            _ => None,
        }
    }
}

impl Default for OkxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            secret_key: None,
            passphrase: None,
            simulated: false,
            proxy_url: None,
            rest_url: default_okx_rest_url(),
            ws_url: default_okx_ws_url(),
            ws_simulated_url: default_okx_ws_simulated_url(),
        }
    }
}

fn default_okx_rest_url() -> String {
    "https://www.okx.com".to_string()
}

fn default_okx_ws_url() -> String {
    "wss://ws.okx.com:8443/ws/v5/public".to_string()
}

fn default_okx_ws_simulated_url() -> String {
    "wss://wspap.okx.com:8443/ws/v5/public".to_string()
}

/// One spot/perpetual pair and its trading parameters
///
/// Accepts both snake_case keys and the PascalCase keys of a
/// `TradingPairs.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingPairConfig {
    /// Spot instrument, e.g. `DOGE-USDT`
    #[serde(alias = "Spot")]
    pub spot: String,
    /// Perpetual swap instrument, e.g. `DOGE-USDT-SWAP`
    #[serde(alias = "Swap")]
    pub swap: String,
    /// Spread at or above which a hedge is opened
    #[serde(alias = "OpenThreshold")]
    pub open_threshold: Decimal,
    /// Spread at or below which an open hedge is closed
    #[serde(alias = "CloseThreshold")]
    pub close_threshold: Decimal,
    /// Reserved, not used by the decision logic
    #[serde(default, alias = "SellLevel")]
    pub sell_level: Decimal,
    /// Spot leg order size
    #[serde(alias = "SpotQuantity")]
    pub spot_quantity: Decimal,
    /// Swap leg order size (contracts)
    #[serde(alias = "SwapQuantity")]
    pub swap_quantity: Decimal,
}

impl TradingPairConfig {
    /// Key identifying this pair in the position book
    pub fn key(&self) -> String {
        format!("{}_{}", self.spot, self.swap)
    }

    /// Base currency of the spot leg (`DOGE` for `DOGE-USDT`)
    pub fn spot_currency(&self) -> &str {
        base_currency(&self.spot)
    }

    /// Base currency of the swap leg (`DOGE` for `DOGE-USDT-SWAP`)
    pub fn swap_currency(&self) -> &str {
        base_currency(&self.swap)
    }

    /// True when the thresholds form a proper hysteresis band
    pub fn has_hysteresis(&self) -> bool {
        self.open_threshold > self.close_threshold
    }
}

fn base_currency(symbol: &str) -> &str {
    symbol.split('-').next().unwrap_or(symbol)
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
    /// Delay between feed reconnection attempts in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Decision loop cadence in milliseconds
    #[serde(default = "default_decision_interval")]
    pub decision_interval_ms: u64,
    /// Time given to the feed to deliver first ticks before seeding positions
    #[serde(default = "default_warmup")]
    pub warmup_seconds: u64,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Keep-alive ping interval for the feed in seconds
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
}

impl AppSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn decision_interval(&self) -> Duration {
        Duration::from_millis(self.decision_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            reconnect_delay_ms: default_reconnect_delay(),
            decision_interval_ms: default_decision_interval(),
            warmup_seconds: default_warmup(),
            request_timeout_seconds: default_request_timeout(),
            ping_interval_seconds: default_ping_interval(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_decision_interval() -> u64 {
    1000
}

fn default_warmup() -> u64 {
    2
}

fn default_request_timeout() -> u64 {
    30
}

fn default_ping_interval() -> u64 {
    20
}

/// API credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }
}
