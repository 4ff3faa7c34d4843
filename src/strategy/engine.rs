//! Periodic spread evaluation and hedge transitions for every configured pair

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, trace, warn};

use super::execution::{execute_legs, ExecutionError, HedgeAction, LegAcks};
use super::positions::{PositionBook, PositionState};
use super::spread::compute_spread;
use crate::common::traits::TradingClient;
use crate::config::TradingPairConfig;
use crate::market::PriceReader;

/// Why a pair was not evaluated this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No quote received yet for one of the legs
    MissingQuote,
    /// Spot price not positive, or the spread does not fit a decimal
    UndefinedSpread,
    /// Pair needs reconciliation but the account could not be queried
    AccountUnavailable,
    /// Account shows one leg without the other; waiting for an operator
    UnhedgedExposure,
}

/// Result of evaluating one pair in one cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Skipped(SkipReason),
    /// Spread inside the band (or on the wrong side for the current state)
    Held { spread: Decimal },
    Opened { spread: Decimal, acks: LegAcks },
    Closed { spread: Decimal, acks: LegAcks },
    /// First leg failed; state unchanged
    LegRejected { action: HedgeAction, error: String },
    /// Second leg failed; pair marked indeterminate
    PartiallyExecuted { action: HedgeAction, error: String },
    /// Indeterminate pair resolved from spot balance and swap short
    Reconciled(PositionState),
}

/// Transition called for by `spread` in `state`, if any
///
/// Closed pairs open at or above the open threshold; open pairs close at or
/// below the close threshold.
pub fn decide(
    state: PositionState,
    spread: Decimal,
    pair: &TradingPairConfig,
) -> Option<HedgeAction> {
    match state {
        PositionState::Closed if spread >= pair.open_threshold => Some(HedgeAction::Open),
        PositionState::Open if spread <= pair.close_threshold => Some(HedgeAction::Close),
        _ => None,
    }
}

/// Decision loop over all pairs
pub struct SpreadEngine {
    client: Arc<dyn TradingClient>,
    prices: PriceReader,
    pairs: Vec<TradingPairConfig>,
    positions: PositionBook,
    interval: Duration,
}

impl SpreadEngine {
    pub fn new(
        client: Arc<dyn TradingClient>,
        prices: PriceReader,
        pairs: Vec<TradingPairConfig>,
        positions: PositionBook,
    ) -> Self {
        Self {
            client,
            prices,
            pairs,
            positions,
            interval: Duration::from_secs(1),
        }
    }

    /// Set the time between cycles
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    /// Evaluate all pairs forever, one cycle per interval
    ///
    /// A cycle that overruns delays the next tick instead of bunching ticks.
    pub async fn run(mut self) {
        info!(
            pairs = self.pairs.len(),
            interval = ?self.interval,
            "Starting decision loop"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// Evaluate every pair once, in configuration order
    #[instrument(skip(self))]
    pub async fn run_cycle(&mut self) -> Vec<PairOutcome> {
        let Self {
            client,
            prices,
            pairs,
            positions,
            ..
        } = self;

        let mut outcomes = Vec::with_capacity(pairs.len());
        for pair in pairs.iter() {
            let outcome = evaluate_pair(&**client, prices, positions, pair).await;
            outcomes.push(outcome);
        }
        outcomes
    }
}

async fn evaluate_pair(
    client: &dyn TradingClient,
    prices: &PriceReader,
    positions: &mut PositionBook,
    pair: &TradingPairConfig,
) -> PairOutcome {
    let key = pair.key();
    let state = positions.get(&key);

    if state == PositionState::Indeterminate {
        return reconcile(client, positions, pair).await;
    }

    let (spot, swap) = prices.get_pair(&pair.spot, &pair.swap).await;
    let (Some(spot), Some(swap)) = (spot, swap) else {
        trace!(pair = %key, "Missing quote, skipping");
        return PairOutcome::Skipped(SkipReason::MissingQuote);
    };

    let Some(spread) = compute_spread(spot.last_price, swap.last_price) else {
        warn!(
            pair = %key,
            spot = %spot.last_price,
            swap = %swap.last_price,
            "Spread undefined, skipping"
        );
        return PairOutcome::Skipped(SkipReason::UndefinedSpread);
    };

    debug!(
        pair = %key,
        spot = %spot.last_price,
        swap = %swap.last_price,
        %spread,
        %state,
        "Spread evaluated"
    );

    let Some(action) = decide(state, spread, pair) else {
        return PairOutcome::Held { spread };
    };

    info!(pair = %key, %spread, %action, "Threshold crossed");
    let (leg_a, leg_b) = action.orders(pair);

    match execute_legs(client, &leg_a, &leg_b).await {
        Ok(acks) => {
            positions.set(key.clone(), action.target_state());
            info!(
                pair = %key,
                spot_order = %acks.first.order_id,
                swap_order = %acks.second.order_id,
                "Hedge {} complete",
                action
            );
            match action {
                HedgeAction::Open => PairOutcome::Opened { spread, acks },
                HedgeAction::Close => PairOutcome::Closed { spread, acks },
            }
        }
        Err(e @ ExecutionError::LegRejected { .. }) => {
            warn!(pair = %key, "Hedge {} not started: {}", action, e);
            PairOutcome::LegRejected {
                action,
                error: e.to_string(),
            }
        }
        Err(e @ ExecutionError::PartialExecution { .. }) => {
            positions.set(key.clone(), PositionState::Indeterminate);
            error!(
                pair = %key,
                "Hedge {} half executed, pair requires manual reconciliation: {}",
                action,
                e
            );
            PairOutcome::PartiallyExecuted {
                action,
                error: e.to_string(),
            }
        }
    }
}

/// Resolve an indeterminate pair from the account, never by trading
///
/// Both the spot balance and the swap short must agree before the pair
/// trades again. A one-sided account keeps the pair out of trading.
async fn reconcile(
    client: &dyn TradingClient,
    positions: &mut PositionBook,
    pair: &TradingPairConfig,
) -> PairOutcome {
    let key = pair.key();
    let balances = match client.get_balances().await {
        Ok(balances) => balances,
        Err(e) => {
            warn!(pair = %key, "Balance query failed, pair stays indeterminate: {}", e);
            return PairOutcome::Skipped(SkipReason::AccountUnavailable);
        }
    };
    let short_size = match client.get_short_position(&pair.swap).await {
        Ok(size) => size,
        Err(e) => {
            warn!(pair = %key, "Position query failed, pair stays indeterminate: {}", e);
            return PairOutcome::Skipped(SkipReason::AccountUnavailable);
        }
    };

    match positions.reconcile(pair, &balances, short_size) {
        PositionState::Indeterminate => {
            error!(
                pair = %key,
                spot_balance = %balances.available(pair.spot_currency()),
                %short_size,
                "One-sided exposure, pair held until reconciled manually"
            );
            PairOutcome::Skipped(SkipReason::UnhedgedExposure)
        }
        state => {
            warn!(pair = %key, %state, "Indeterminate pair reconciled against account");
            PairOutcome::Reconciled(state)
        }
    }
}
