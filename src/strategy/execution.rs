//! Two-leg order sequencing
//!
//! A hedge transition is two market orders sent one after the other. The
//! first leg failing leaves the account untouched; the second leg failing
//! leaves a one-sided exposure that the caller must reconcile.

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::positions::PositionState;
use crate::common::errors::ClientError;
use crate::common::traits::TradingClient;
use crate::common::types::{OrderAck, OrderRequest, Side};
use crate::config::TradingPairConfig;

/// Outcome of a failed two-leg sequence
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// First leg refused or not delivered; nothing was executed
    #[error("first leg ({order}) failed: {source}")]
    LegRejected {
        order: String,
        #[source]
        source: ClientError,
    },

    /// First leg accepted, second leg failed; exposure is one-sided
    #[error("second leg ({order}) failed after first leg {first_order_id} was accepted: {source}")]
    PartialExecution {
        first_order_id: String,
        order: String,
        #[source]
        source: ClientError,
    },
}

/// Acknowledgements of both legs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegAcks {
    pub first: OrderAck,
    pub second: OrderAck,
}

/// Direction of a hedge transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HedgeAction {
    /// Buy spot, then short the swap
    Open,
    /// Sell spot, then cover the swap short
    Close,
}

impl HedgeAction {
    /// Orders for this transition, in submission order
    pub fn orders(&self, pair: &TradingPairConfig) -> (OrderRequest, OrderRequest) {
        let (spot_side, swap_side) = match self {
            HedgeAction::Open => (Side::Buy, Side::Sell),
            HedgeAction::Close => (Side::Sell, Side::Buy),
        };
        (
            OrderRequest::spot_market(&pair.spot, spot_side, pair.spot_quantity),
            OrderRequest::short_market(&pair.swap, swap_side, pair.swap_quantity),
        )
    }

    /// State the pair is in once both legs are accepted
    pub fn target_state(&self) -> PositionState {
        match self {
            HedgeAction::Open => PositionState::Open,
            HedgeAction::Close => PositionState::Closed,
        }
    }
}

impl std::fmt::Display for HedgeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HedgeAction::Open => write!(f, "open"),
            HedgeAction::Close => write!(f, "close"),
        }
    }
}

/// Submit `leg_a`, then `leg_b` only if `leg_a` was accepted
#[instrument(skip_all, fields(leg_a = %leg_a, leg_b = %leg_b))]
pub async fn execute_legs(
    client: &dyn TradingClient,
    leg_a: &OrderRequest,
    leg_b: &OrderRequest,
) -> Result<LegAcks, ExecutionError> {
    let first = match submit(client, leg_a).await {
        Ok(ack) => ack,
        Err(source) => {
            if source.is_rejection() {
                warn!("First leg refused, nothing executed: {}", source);
            } else {
                error!("First leg not confirmed by the exchange: {}", source);
            }
            return Err(ExecutionError::LegRejected {
                order: leg_a.to_string(),
                source,
            });
        }
    };
    info!(order_id = %first.order_id, "First leg accepted");

    match submit(client, leg_b).await {
        Ok(second) => {
            info!(order_id = %second.order_id, "Second leg accepted");
            Ok(LegAcks { first, second })
        }
        Err(source) => {
            error!(
                first_order_id = %first.order_id,
                refused = source.is_rejection(),
                "Second leg failed after first leg was accepted, exposure is one-sided: {}",
                source
            );
            Err(ExecutionError::PartialExecution {
                first_order_id: first.order_id,
                order: leg_b.to_string(),
                source,
            })
        }
    }
}

async fn submit(client: &dyn TradingClient, order: &OrderRequest) -> Result<OrderAck, ClientError> {
    let ack = client.submit_order(order).await?;
    if !ack.is_success() {
        return Err(ClientError::Rejected {
            code: ack.code,
            message: ack.message,
        });
    }
    Ok(ack)
}
