//! REST API client for the OKX v5 trading and account endpoints

use async_trait::async_trait;
use reqwest::{Client, Proxy, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::auth::generate_auth_headers;
use super::messages::*;
use crate::common::errors::{ClientError, Result};
use crate::common::traits::TradingClient;
use crate::common::types::{BalanceSnapshot, OrderAck, OrderRequest};
use crate::config::types::{ApiCredentials, OkxConfig};

const BALANCE_PATH: &str = "/api/v5/account/balance";
const POSITIONS_PATH: &str = "/api/v5/account/positions";
const ORDER_PATH: &str = "/api/v5/trade/order";
const CANCEL_ORDER_PATH: &str = "/api/v5/trade/cancel-order";
const PENDING_ORDERS_PATH: &str = "/api/v5/trade/orders-pending";

/// REST API client for OKX
#[derive(Debug, Clone)]
pub struct OkxRestClient {
    /// HTTP client
    client: Client,
    /// Base URL, e.g. `https://www.okx.com`
    base_url: String,
    /// API credentials; every endpoint used here is private
    credentials: Option<ApiCredentials>,
    /// Route requests to the demo trading environment
    simulated: bool,
}

impl OkxRestClient {
    /// Create a new REST client with the default 30 second timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Internal(e.to_string()))?;

        Ok(Self::from_parts(client, base_url))
    }

    /// Build a client from configuration: credentials, demo flag and optional proxy
    pub fn from_config(config: &OkxConfig, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| ClientError::Configuration(format!("Invalid proxy url: {}", e)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Internal(e.to_string()))?;

        let mut rest = Self::from_parts(client, &config.rest_url).simulated(config.simulated);
        if let Some(creds) = config.credentials() {
            rest = rest.with_credentials(creds);
        }
        Ok(rest)
    }

    fn from_parts(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            simulated: false,
        }
    }

    /// Set API credentials for authenticated requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Toggle the `x-simulated-trading` header
    pub fn simulated(mut self, simulated: bool) -> Self {
        self.simulated = simulated;
        self
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    // ========================================================================
    // Account Endpoints
    // ========================================================================

    /// Get the trading account balance
    #[instrument(skip(self))]
    pub async fn get_balance(&self) -> Result<Vec<BalanceData>> {
        self.signed_get(BALANCE_PATH).await
    }

    /// Get open positions, optionally for a single instrument
    #[instrument(skip(self))]
    pub async fn get_positions(&self, inst_id: Option<&str>) -> Result<Vec<PositionData>> {
        let path = with_query(POSITIONS_PATH, &[("instId", inst_id)]);
        self.signed_get(&path).await
    }

    // ========================================================================
    // Trade Endpoints
    // ========================================================================

    /// Place an order
    #[instrument(skip(self, order), fields(order = %order))]
    pub async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let body = PlaceOrderRequest::from(order);
        let results: Vec<OrderResult> = self.signed_post(ORDER_PATH, &body).await?;
        first_order_ack(results)
    }

    /// Cancel an order by exchange order ID
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, inst_id: &str, ord_id: &str) -> Result<OrderAck> {
        let body = CancelOrderRequest {
            inst_id: inst_id.to_string(),
            ord_id: ord_id.to_string(),
        };
        let results: Vec<OrderResult> = self.signed_post(CANCEL_ORDER_PATH, &body).await?;
        first_order_ack(results)
    }

    /// Get details of one order
    #[instrument(skip(self))]
    pub async fn get_order(&self, inst_id: &str, ord_id: &str) -> Result<OrderDetail> {
        let path = with_query(ORDER_PATH, &[("instId", Some(inst_id)), ("ordId", Some(ord_id))]);
        let mut orders: Vec<OrderDetail> = self.signed_get(&path).await?;
        if orders.is_empty() {
            return Err(ClientError::InvalidResponse(format!(
                "Order {} not returned for {}",
                ord_id, inst_id
            )));
        }
        Ok(orders.swap_remove(0))
    }

    /// Get unfilled orders, optionally for a single instrument
    #[instrument(skip(self))]
    pub async fn get_pending_orders(&self, inst_id: Option<&str>) -> Result<Vec<OrderDetail>> {
        let path = with_query(PENDING_ORDERS_PATH, &[("instId", inst_id)]);
        self.signed_get(&path).await
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    fn credentials(&self) -> Result<&ApiCredentials> {
        self.credentials.as_ref().ok_or_else(|| {
            ClientError::Authentication("API credentials are not configured".to_string())
        })
    }

    /// Signed GET; `path` includes the query string, which is part of the signature
    async fn signed_get<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let auth = generate_auth_headers(self.credentials()?, self.simulated, "GET", path, "")?;
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = auth.apply_to_request(self.client.get(&url));
        let response = request.send().await.map_err(map_send_error)?;
        Self::read_envelope(response).await
    }

    /// Signed POST with a JSON body
    async fn signed_post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<T>> {
        let body = serde_json::to_string(body)?;
        let auth = generate_auth_headers(self.credentials()?, self.simulated, "POST", path, &body)?;
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} {}", url, body);

        let request = auth.apply_to_request(self.client.post(&url)).body(body);
        let response = request.send().await.map_err(map_send_error)?;
        Self::read_envelope(response).await
    }

    /// Check the HTTP status, then the `code` of the v5 envelope
    async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<Vec<T>> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::RateLimit {
                message,
                retry_after_seconds,
            });
        }

        let text = response.text().await?;

        // OKX also answers auth and parameter errors with a 4xx plus an envelope
        let envelope: ApiResponse<serde_json::Value> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ClientError::InvalidResponse(format!(
                    "Server returned status {}: {}",
                    status, text
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if !envelope.is_success() {
            return Err(envelope_error(envelope));
        }

        envelope
            .data
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(ClientError::from))
            .collect()
    }
}

#[async_trait]
impl TradingClient for OkxRestClient {
    async fn get_balances(&self) -> Result<BalanceSnapshot> {
        let accounts = self.get_balance().await?;
        balance_snapshot(&accounts)
    }

    async fn get_short_position(&self, inst_id: &str) -> Result<Decimal> {
        let positions = self.get_positions(Some(inst_id)).await?;
        Ok(positions
            .iter()
            .filter(|p| p.inst_id == inst_id)
            .map(PositionData::short_size)
            .sum())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        self.place_order(order).await
    }
}

/// Flatten the balance response into available balance per currency
pub fn balance_snapshot(accounts: &[BalanceData]) -> Result<BalanceSnapshot> {
    let mut snapshot = BalanceSnapshot::new();
    let details = accounts.first().map(|a| a.details.as_slice()).unwrap_or(&[]);
    for detail in details {
        let available = if detail.avail_bal.is_empty() {
            Decimal::ZERO
        } else {
            detail.avail_bal.parse().map_err(|e| {
                ClientError::InvalidResponse(format!(
                    "Invalid availBal for {}: {}",
                    detail.ccy, e
                ))
            })?
        };
        snapshot.insert(detail.ccy.clone(), available);
    }
    Ok(snapshot)
}

/// Map an unsuccessful envelope to an error, preferring the per-order code
fn envelope_error(envelope: ApiResponse<serde_json::Value>) -> ClientError {
    let order_result = envelope
        .data
        .into_iter()
        .find_map(|v| serde_json::from_value::<OrderResult>(v).ok())
        .filter(|r| !r.s_code.is_empty() && r.s_code != "0");

    let (code, message) = match order_result {
        Some(r) => (r.s_code, r.s_msg),
        None => (envelope.code, envelope.msg),
    };

    // 501xx are API key, signature and passphrase failures
    if code.starts_with("501") {
        ClientError::Authentication(format!("{} ({})", message, code))
    } else {
        ClientError::Rejected { code, message }
    }
}

fn first_order_ack(results: Vec<OrderResult>) -> Result<OrderAck> {
    let result = results.into_iter().next().ok_or_else(|| {
        ClientError::InvalidResponse("Order response carried no result".to_string())
    })?;

    if result.s_code != "0" {
        warn!(code = %result.s_code, msg = %result.s_msg, "order refused");
        return Err(ClientError::Rejected {
            code: result.s_code,
            message: result.s_msg,
        });
    }

    Ok(OrderAck {
        order_id: result.ord_id,
        client_order_id: result.cl_ord_id.filter(|id| !id.is_empty()),
        code: result.s_code,
        message: result.s_msg,
    })
}

fn map_send_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(err.to_string())
    } else {
        ClientError::HttpRequest(err)
    }
}

/// Append the present parameters as a query string
fn with_query(path: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params {
        if let Some(value) = value {
            query.append_pair(key, value);
            any = true;
        }
    }
    if any {
        format!("{}?{}", path, query.finish())
    } else {
        path.to_string()
    }
}
