//! OKX-specific wire types for the public WebSocket and the v5 REST API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{OrderRequest, PositionSide};

// ============================================================================
// WebSocket Types
// ============================================================================

/// Channel argument used in subscribe requests and echoed in pushes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsChannelArg {
    pub channel: String,
    #[serde(rename = "instId", default, skip_serializing_if = "Option::is_none")]
    pub inst_id: Option<String>,
}

impl WsChannelArg {
    pub fn tickers(inst_id: impl Into<String>) -> Self {
        Self {
            channel: "tickers".to_string(),
            inst_id: Some(inst_id.into()),
        }
    }
}

/// Subscribe/unsubscribe operation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsOperationMessage {
    /// Operation type, "subscribe" or "unsubscribe"
    pub op: String,
    pub args: Vec<WsChannelArg>,
}

impl WsOperationMessage {
    /// One subscribe request covering the ticker channel of every symbol
    pub fn subscribe_tickers(symbols: &[String]) -> Self {
        Self {
            op: "subscribe".to_string(),
            args: symbols.iter().map(WsChannelArg::tickers).collect(),
        }
    }
}

/// Any inbound message: a data push, or an event (subscribe ack, error)
#[derive(Debug, Clone, Deserialize)]
pub struct WsPush {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub arg: Option<WsChannelArg>,
    /// Entries are kept raw so one malformed entry does not drop the batch
    #[serde(default)]
    pub data: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// One entry of a `tickers` push
#[derive(Debug, Clone, Deserialize)]
pub struct TickerData {
    #[serde(rename = "instId")]
    pub inst_id: String,
    /// Last traded price
    pub last: String,
    #[serde(default)]
    pub ts: Option<String>,
}

// ============================================================================
// REST API Types
// ============================================================================

/// Envelope of every v5 REST response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == "0"
    }
}

/// Account entry from GET /api/v5/account/balance
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceData {
    #[serde(rename = "totalEq", default)]
    pub total_eq: Option<String>,
    #[serde(default)]
    pub details: Vec<BalanceDetail>,
}

/// Per-currency balance detail
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceDetail {
    pub ccy: String,
    #[serde(rename = "availBal", default)]
    pub avail_bal: String,
}

/// Body of POST /api/v5/trade/order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceOrderRequest {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "tdMode")]
    pub td_mode: String,
    pub side: String,
    #[serde(rename = "ordType")]
    pub ord_type: String,
    pub sz: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub px: Option<String>,
    #[serde(rename = "reduceOnly", skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(rename = "posSide", skip_serializing_if = "Option::is_none")]
    pub pos_side: Option<String>,
}

impl From<&OrderRequest> for PlaceOrderRequest {
    fn from(order: &OrderRequest) -> Self {
        Self {
            inst_id: order.inst_id.clone(),
            td_mode: order.trade_mode.to_string(),
            side: order.side.to_string(),
            ord_type: order.order_type.to_string(),
            sz: order.size.normalize().to_string(),
            px: order.price.map(|p| p.normalize().to_string()),
            reduce_only: order.reduce_only.then_some(true),
            pos_side: order.position_side.map(|s: PositionSide| s.to_string()),
        }
    }
}

/// Per-order result of place/cancel requests
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResult {
    #[serde(rename = "ordId", default)]
    pub ord_id: String,
    #[serde(rename = "clOrdId", default)]
    pub cl_ord_id: Option<String>,
    #[serde(rename = "sCode", default)]
    pub s_code: String,
    #[serde(rename = "sMsg", default)]
    pub s_msg: String,
}

/// Body of POST /api/v5/trade/cancel-order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelOrderRequest {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "ordId")]
    pub ord_id: String,
}

/// Order details from GET /api/v5/trade/order and /orders-pending
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetail {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "ordId")]
    pub ord_id: String,
    #[serde(rename = "clOrdId", default)]
    pub cl_ord_id: Option<String>,
    pub side: String,
    #[serde(rename = "ordType")]
    pub ord_type: String,
    #[serde(rename = "posSide", default)]
    pub pos_side: Option<String>,
    pub sz: String,
    #[serde(default)]
    pub px: Option<String>,
    pub state: String,
    #[serde(rename = "accFillSz", default)]
    pub acc_fill_sz: Option<String>,
    #[serde(rename = "avgPx", default)]
    pub avg_px: Option<String>,
    #[serde(rename = "cTime", default)]
    pub c_time: Option<String>,
}

impl OrderDetail {
    /// Filled quantity, zero when the field is absent or empty
    pub fn filled(&self) -> Decimal {
        parse_decimal_or_zero(self.acc_fill_sz.as_deref())
    }
}

/// Position from GET /api/v5/account/positions
#[derive(Debug, Clone, Deserialize)]
pub struct PositionData {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "instType", default)]
    pub inst_type: Option<String>,
    #[serde(rename = "posSide", default)]
    pub pos_side: Option<String>,
    #[serde(default)]
    pub pos: String,
    #[serde(rename = "avgPx", default)]
    pub avg_px: Option<String>,
    #[serde(default)]
    pub upl: Option<String>,
    #[serde(rename = "mgnMode", default)]
    pub mgn_mode: Option<String>,
}

impl PositionData {
    /// Position size in contracts, zero when empty
    pub fn size(&self) -> Decimal {
        parse_decimal_or_zero(Some(self.pos.as_str()))
    }

    /// Contracts held short: a `short` position side, or a negative net position
    pub fn short_size(&self) -> Decimal {
        let size = self.size();
        match self.pos_side.as_deref() {
            Some("short") => size.abs(),
            Some("long") => Decimal::ZERO,
            _ if size.is_sign_negative() => size.abs(),
            _ => Decimal::ZERO,
        }
    }
}

/// OKX sends empty strings for numbers that do not apply
fn parse_decimal_or_zero(raw: Option<&str>) -> Decimal {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or(Decimal::ZERO)
}
