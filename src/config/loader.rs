//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;
use tracing::{info, warn};

use super::types::{AppConfig, TradingPairConfig};
use crate::common::errors::{ClientError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. `OKX_API_KEY` / `OKX_SECRET_KEY` / `OKX_PASSPHRASE` for credentials
/// 2. Environment variables (prefixed with APP_, `__` between sections)
/// 3. Configuration file (TOML or JSON)
/// 4. Default values
///
/// Pairs listed in `pairs_file` are appended to the inline `pairs`.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        } else {
            warn!("Configuration file {} not found, using defaults", path);
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

    apply_env_credentials(&mut app);

    if let Some(pairs_file) = app.pairs_file.clone() {
        let extra = load_trading_pairs(&pairs_file)?;
        info!("Loaded {} pairs from {}", extra.len(), pairs_file);
        app.pairs.extend(extra);
    }

    Ok(app)
}

/// Load a `TradingPairs.json` file: a JSON array of pair records
pub fn load_trading_pairs(path: &str) -> Result<Vec<TradingPairConfig>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ClientError::Configuration(format!("Failed to read {}: {}", path, e)))?;
    parse_trading_pairs(&raw)
}

/// Parse a JSON array of pair records
pub fn parse_trading_pairs(raw: &str) -> Result<Vec<TradingPairConfig>> {
    serde_json::from_str(raw)
        .map_err(|e| ClientError::Configuration(format!("Invalid trading pairs: {}", e)))
}

/// Override credentials from the plain OKX_* environment variables
fn apply_env_credentials(app: &mut AppConfig) {
    if let Ok(key) = std::env::var("OKX_API_KEY") {
        app.okx.api_key = Some(key);
    }
    if let Ok(secret) = std::env::var("OKX_SECRET_KEY") {
        app.okx.secret_key = Some(secret);
    }
    if let Ok(passphrase) = std::env::var("OKX_PASSPHRASE") {
        app.okx.passphrase = Some(passphrase);
    }
}

/// Check the loaded configuration before anything is started
///
/// Missing credentials, an empty pair list or a zero interval are fatal.
/// An inverted threshold band is only warned about, it is a legal if odd
/// setup.
pub fn validate(app: &AppConfig) -> Result<()> {
    if app.pairs.is_empty() {
        return Err(ClientError::Configuration(
            "no trading pairs configured".to_string(),
        ));
    }
    if app.okx.credentials().is_none() {
        return Err(ClientError::Configuration(
            "OKX api_key, secret_key and passphrase are required".to_string(),
        ));
    }
    let intervals = [
        ("decision_interval_ms", app.settings.decision_interval_ms),
        ("ping_interval_seconds", app.settings.ping_interval_seconds),
        ("reconnect_delay_ms", app.settings.reconnect_delay_ms),
        ("request_timeout_seconds", app.settings.request_timeout_seconds),
    ];
    if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
        return Err(ClientError::Configuration(format!("{} must be positive", name)));
    }
    url::Url::parse(app.okx.websocket_url())
        .map_err(|e| ClientError::Configuration(format!("Invalid websocket url: {}", e)))?;
    url::Url::parse(&app.okx.rest_url)
        .map_err(|e| ClientError::Configuration(format!("Invalid rest url: {}", e)))?;

    for pair in &app.pairs {
        if !pair.has_hysteresis() {
            warn!(
                pair = %pair.key(),
                open = %pair.open_threshold,
                close = %pair.close_threshold,
                "open threshold is not above close threshold, positions may flap"
            );
        }
    }
    Ok(())
}
