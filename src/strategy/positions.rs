//! Per-pair hedge state

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::common::types::BalanceSnapshot;
use crate::config::TradingPairConfig;

/// Spot balance above which a pair is considered hedged at startup
const SEED_SPOT_MIN: Decimal = dec!(1);
/// Swap balance at or above which a pair is considered hedged at startup
const SEED_SWAP_MIN: Decimal = dec!(0.0001);

/// Hedge state of one pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PositionState {
    /// No hedge held
    #[default]
    Closed,
    /// Long spot and short swap held
    Open,
    /// A two-leg sequence stopped halfway; no trading until the account
    /// shows both legs held or both flat
    Indeterminate,
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        matches!(self, PositionState::Open)
    }

    /// Startup estimate from account balances
    pub fn from_balances(pair: &TradingPairConfig, balances: &BalanceSnapshot) -> Self {
        let spot = balances.available(pair.spot_currency());
        let swap = balances.available(pair.swap_currency());
        if spot > SEED_SPOT_MIN && swap >= SEED_SWAP_MIN {
            PositionState::Open
        } else {
            PositionState::Closed
        }
    }

    /// State backed by the account: spot balance and the swap short size
    ///
    /// Only a matching pair of legs resolves; one leg without the other
    /// stays indeterminate.
    pub fn from_exposure(
        pair: &TradingPairConfig,
        balances: &BalanceSnapshot,
        short_size: Decimal,
    ) -> Self {
        let spot_held = balances.available(pair.spot_currency()) > SEED_SPOT_MIN;
        let short_held = short_size >= SEED_SWAP_MIN;
        match (spot_held, short_held) {
            (true, true) => PositionState::Open,
            (false, false) => PositionState::Closed,
            _ => PositionState::Indeterminate,
        }
    }
}

impl std::fmt::Display for PositionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionState::Closed => write!(f, "closed"),
            PositionState::Open => write!(f, "open"),
            PositionState::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Position state of every configured pair, keyed by `"{spot}_{swap}"`
///
/// Each pair owns its own entry; changing one never touches another.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    states: HashMap<String, PositionState>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every pair from a balance snapshot
    pub fn initialize(pairs: &[TradingPairConfig], balances: &BalanceSnapshot) -> Self {
        let mut book = Self::new();
        for pair in pairs {
            book.reseed(pair, balances);
        }
        book
    }

    /// State of a pair; unknown keys read as closed
    pub fn get(&self, key: &str) -> PositionState {
        self.states.get(key).copied().unwrap_or_default()
    }

    pub fn is_open(&self, key: &str) -> bool {
        self.get(key).is_open()
    }

    pub fn set(&mut self, key: impl Into<String>, state: PositionState) {
        let key = key.into();
        debug!(pair = %key, %state, "Position state set");
        self.states.insert(key, state);
    }

    /// Re-derive one pair's state from balances
    pub fn reseed(&mut self, pair: &TradingPairConfig, balances: &BalanceSnapshot) -> PositionState {
        let state = PositionState::from_balances(pair, balances);
        info!(
            pair = %pair.key(),
            spot_balance = %balances.available(pair.spot_currency()),
            swap_balance = %balances.available(pair.swap_currency()),
            %state,
            "Position seeded from balances"
        );
        self.states.insert(pair.key(), state);
        state
    }

    /// Re-derive one pair's state from its spot balance and swap short
    pub fn reconcile(
        &mut self,
        pair: &TradingPairConfig,
        balances: &BalanceSnapshot,
        short_size: Decimal,
    ) -> PositionState {
        let state = PositionState::from_exposure(pair, balances, short_size);
        info!(
            pair = %pair.key(),
            spot_balance = %balances.available(pair.spot_currency()),
            short_size = %short_size,
            %state,
            "Position reconciled against account"
        );
        self.states.insert(pair.key(), state);
        state
    }

    /// Snapshot sorted by pair key
    pub fn entries(&self) -> Vec<(String, PositionState)> {
        let mut entries: Vec<_> = self
            .states
            .iter()
            .map(|(key, state)| (key.clone(), *state))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
