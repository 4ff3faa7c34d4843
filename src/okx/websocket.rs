//! WebSocket transport for the OKX public tickers channel

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, instrument, warn};

use super::messages::{TickerData, WsOperationMessage, WsPush};
use crate::common::errors::{ClientError, Result};
use crate::common::traits::{FeedSession, MarketDataTransport};
use crate::common::types::TickerUpdate;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Public market data transport for OKX
#[derive(Debug, Clone)]
pub struct OkxWebSocketTransport {
    /// WebSocket URL (live or demo public endpoint)
    url: String,
    /// Idle time after which a keep-alive `ping` is sent
    ping_interval: Duration,
}

impl OkxWebSocketTransport {
    /// Create a transport for the given public endpoint
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ping_interval: Duration::from_secs(20),
        }
    }

    /// Set the keep-alive interval; OKX closes connections idle for 30 seconds
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MarketDataTransport for OkxWebSocketTransport {
    #[instrument(skip(self, symbols), fields(url = %self.url, symbols = symbols.len()))]
    async fn open(&self, symbols: &[String]) -> Result<Box<dyn FeedSession>> {
        info!("Connecting to OKX WebSocket");

        let (mut stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ClientError::WebSocketConnection(e.to_string()))?;

        let subscribe_msg = WsOperationMessage::subscribe_tickers(symbols);
        let msg_json = serde_json::to_string(&subscribe_msg)?;
        debug!("Sending subscription message: {}", msg_json);
        stream.send(Message::Text(msg_json)).await?;

        Ok(Box::new(OkxFeedSession {
            stream,
            ping_interval: self.ping_interval,
            awaiting_pong: false,
        }))
    }

    fn decode(&self, raw: &str) -> Result<Vec<TickerUpdate>> {
        parse_tickers(raw)
    }
}

/// A live OKX connection with keep-alive handling
pub struct OkxFeedSession {
    stream: WsStream,
    ping_interval: Duration,
    awaiting_pong: bool,
}

#[async_trait]
impl FeedSession for OkxFeedSession {
    async fn next_message(&mut self) -> Result<Option<String>> {
        loop {
            let next = match tokio::time::timeout(self.ping_interval, self.stream.next()).await {
                Ok(next) => next,
                Err(_) if self.awaiting_pong => {
                    return Err(ClientError::Timeout(
                        "no pong received for keep-alive ping".to_string(),
                    ));
                }
                Err(_) => {
                    debug!("Connection idle, sending ping");
                    self.stream.send(Message::Text("ping".to_string())).await?;
                    self.awaiting_pong = true;
                    continue;
                }
            };

            // Any frame proves the connection is alive
            self.awaiting_pong = false;

            match next {
                Some(Ok(Message::Text(text))) => {
                    if text == "pong" {
                        debug!("Received pong");
                        continue;
                    }
                    return Ok(Some(text));
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("WebSocket closed: {:?}", frame);
                    return Ok(None);
                }
                Some(Ok(_)) => {
                    // Binary and protocol-level ping/pong frames carry no tickers
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            }
        }
    }
}

/// Decode an OKX push into ticker updates
///
/// Event messages (`subscribe` acks, `error`) carry no data and yield an
/// empty list. Entries with a missing or unparsable `last` are skipped.
pub fn parse_tickers(raw: &str) -> Result<Vec<TickerUpdate>> {
    let push: WsPush = serde_json::from_str(raw)?;

    if let Some(event) = push.event.as_deref() {
        match event {
            "error" => warn!(
                code = push.code.as_deref().unwrap_or_default(),
                msg = push.msg.as_deref().unwrap_or_default(),
                "OKX WebSocket error event"
            ),
            _ => debug!("OKX WebSocket event: {} {:?}", event, push.arg),
        }
    }

    let Some(entries) = push.data else {
        return Ok(Vec::new());
    };

    let updates = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<TickerData>(entry) {
            Ok(ticker) => match ticker.last.parse() {
                Ok(last_price) => Some(TickerUpdate::new(ticker.inst_id, last_price)),
                Err(e) => {
                    warn!("Bad last price {:?} for {}: {}", ticker.last, ticker.inst_id, e);
                    None
                }
            },
            Err(e) => {
                warn!("Skipping malformed ticker entry: {}", e);
                None
            }
        })
        .collect();

    Ok(updates)
}
