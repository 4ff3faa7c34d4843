//! SpreadArbitrage - Main Entry Point
//!
//! Streams OKX tickers for every configured spot/swap pair and runs the
//! spread decision loop until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use spread_arbitrage::config::{load_config, load_trading_pairs, validate};
use spread_arbitrage::market::{ConstantBackoff, MarketDataFeed, PriceCache};
use spread_arbitrage::okx::{OkxRestClient, OkxWebSocketTransport};
use spread_arbitrage::strategy::{PositionBook, SpreadEngine};
use spread_arbitrage::TradingClient;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// JSON file of trading pairs (PascalCase TradingPairs.json format)
    #[arg(long)]
    pairs_file: Option<String>,

    /// Trade on the OKX demo environment
    #[arg(long, env = "OKX_SIMULATED")]
    simulated: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let mut app = load_config(Some(&args.config)).context("failed to load configuration")?;
    if let Some(path) = &args.pairs_file {
        app.pairs.extend(load_trading_pairs(path)?);
    }
    if args.simulated {
        app.okx.simulated = true;
    }

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&app.settings.log_level);
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if args.log_json || app.settings.log_json {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("Starting SpreadArbitrage");
    info!("Configuration file: {}", args.config);

    validate(&app)?;

    let settings = &app.settings;
    info!(
        pairs = app.pairs.len(),
        simulated = app.okx.simulated,
        "Configuration loaded"
    );

    let client: Arc<dyn TradingClient> = Arc::new(
        OkxRestClient::from_config(&app.okx, settings.request_timeout())
            .context("failed to build OKX REST client")?,
    );

    // Market data feed
    let cache = PriceCache::new();
    let prices = cache.reader();
    let transport = OkxWebSocketTransport::new(app.okx.websocket_url())
        .with_ping_interval(settings.ping_interval());
    let feed = MarketDataFeed::new(transport, app.symbols(), cache)
        .with_backoff(ConstantBackoff::new(settings.reconnect_delay()));
    let feed_handle = tokio::spawn(feed.run());

    // Give the feed a moment to fill the cache
    tokio::time::sleep(std::time::Duration::from_secs(settings.warmup_seconds)).await;

    let balances = client
        .get_balances()
        .await
        .context("failed to fetch balances for position seeding")?;
    let positions = PositionBook::initialize(&app.pairs, &balances);
    for (pair, state) in positions.entries() {
        info!(%pair, %state, "Initial position");
    }

    let engine = SpreadEngine::new(client, prices, app.pairs.clone(), positions)
        .with_interval(settings.decision_interval());

    tokio::select! {
        _ = engine.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Received shutdown signal, cleaning up...");
        }
    }

    feed_handle.abort();
    Ok(())
}
