//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spread_arbitrage::common::types::{BalanceSnapshot, OrderAck, OrderRequest, Side};
use spread_arbitrage::{ClientError, Result, TradingClient, TradingPairConfig};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// DOGE pair with a 1% open / 0.3% close band
pub fn doge_pair() -> TradingPairConfig {
    TradingPairConfig {
        spot: "DOGE-USDT".to_string(),
        swap: "DOGE-USDT-SWAP".to_string(),
        open_threshold: dec!(0.01),
        close_threshold: dec!(0.003),
        sell_level: Decimal::ZERO,
        spot_quantity: dec!(100),
        swap_quantity: dec!(1),
    }
}

/// BTC pair with the same band as [`doge_pair`]
pub fn btc_pair() -> TradingPairConfig {
    TradingPairConfig {
        spot: "BTC-USDT".to_string(),
        swap: "BTC-USDT-SWAP".to_string(),
        spot_quantity: dec!(0.01),
        swap_quantity: dec!(1),
        ..doge_pair()
    }
}

pub fn balances(entries: &[(&str, Decimal)]) -> BalanceSnapshot {
    entries
        .iter()
        .map(|(ccy, amount)| (ccy.to_string(), *amount))
        .collect()
}

/// In-memory trading client that records every order it is asked to submit
///
/// Accepted swap orders move the short position per instrument: a sell
/// adds to it, a buy covers it.
#[derive(Default)]
pub struct RecordingClient {
    orders: Mutex<Vec<OrderRequest>>,
    failing_instruments: Mutex<HashSet<String>>,
    balances: Mutex<Option<BalanceSnapshot>>,
    shorts: Mutex<HashMap<String, Decimal>>,
    balance_calls: AtomicUsize,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances(balances: BalanceSnapshot) -> Self {
        let client = Self::default();
        client.set_balances(Some(balances));
        client
    }

    /// `None` makes account queries (balances and positions) fail
    pub fn set_balances(&self, balances: Option<BalanceSnapshot>) {
        *self.balances.lock().unwrap() = balances;
    }

    /// Overwrite the short held on `inst_id`, as a manual trade would
    pub fn set_short(&self, inst_id: &str, size: Decimal) {
        self.shorts.lock().unwrap().insert(inst_id.to_string(), size);
    }

    pub fn short(&self, inst_id: &str) -> Decimal {
        self.shorts
            .lock()
            .unwrap()
            .get(inst_id)
            .copied()
            .unwrap_or_default()
    }

    /// Reject every order on `inst_id` until [`Self::clear_failures`]
    pub fn fail_orders_for(&self, inst_id: &str) {
        self.failing_instruments
            .lock()
            .unwrap()
            .insert(inst_id.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_instruments.lock().unwrap().clear();
    }

    /// Every order submitted so far, including rejected ones
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn orders_for(&self, inst_id: &str) -> Vec<OrderRequest> {
        self.orders()
            .into_iter()
            .filter(|o| o.inst_id == inst_id)
            .collect()
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradingClient for RecordingClient {
    async fn get_balances(&self) -> Result<BalanceSnapshot> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balances
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ClientError::Timeout("balance request timed out".to_string()))
    }

    async fn get_short_position(&self, inst_id: &str) -> Result<Decimal> {
        if self.balances.lock().unwrap().is_none() {
            return Err(ClientError::Timeout("position request timed out".to_string()));
        }
        Ok(self.short(inst_id))
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let count = {
            let mut orders = self.orders.lock().unwrap();
            orders.push(order.clone());
            orders.len()
        };

        if self.failing_instruments.lock().unwrap().contains(&order.inst_id) {
            return Err(ClientError::Rejected {
                code: "51008".to_string(),
                message: "Order failed. Insufficient balance".to_string(),
            });
        }

        if order.position_side.is_some() {
            let mut shorts = self.shorts.lock().unwrap();
            let short = shorts.entry(order.inst_id.clone()).or_default();
            match order.side {
                Side::Sell => *short += order.size,
                Side::Buy => *short = (*short - order.size).max(Decimal::ZERO),
            }
        }

        Ok(OrderAck {
            order_id: format!("ord-{}", count),
            client_order_id: None,
            code: "0".to_string(),
            message: String::new(),
        })
    }
}

/// Sample OKX payloads
pub mod okx_messages {
    pub const BALANCE: &str = r#"{
        "code": "0",
        "msg": "",
        "data": [{
            "totalEq": "10230.55",
            "details": [
                {"ccy": "USDT", "availBal": "10000.5", "eq": "10000.5"},
                {"ccy": "DOGE", "availBal": "2500", "eq": "2500"},
                {"ccy": "BTC", "availBal": "", "eq": "0"}
            ]
        }]
    }"#;

    pub const ORDER_ACCEPTED: &str = r#"{
        "code": "0",
        "msg": "",
        "data": [{"ordId": "312269865356374016", "clOrdId": "", "tag": "", "sCode": "0", "sMsg": ""}]
    }"#;

    pub const ORDER_REJECTED: &str = r#"{
        "code": "1",
        "msg": "Operation failed.",
        "data": [{"ordId": "", "clOrdId": "", "tag": "", "sCode": "51008", "sMsg": "Order failed. Insufficient USDT balance in account."}]
    }"#;

    pub const AUTH_FAILED: &str = r#"{"code": "50113", "msg": "Invalid Sign", "data": []}"#;

    pub fn ticker(inst_id: &str, last: &str) -> String {
        format!(
            r#"{{"arg":{{"channel":"tickers","instId":"{inst_id}"}},"data":[{{"instType":"SPOT","instId":"{inst_id}","last":"{last}","ts":"1704067200000"}}]}}"#
        )
    }
}
