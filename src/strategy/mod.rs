//! Spread arbitrage strategy
//!
//! ```text
//!  PriceReader ──► SpreadEngine::run_cycle ──► execute_legs ──► TradingClient
//!                        │                          │
//!                        └──────── PositionBook ◄───┘
//! ```
//!
//! - [`SpreadEngine`]: evaluates every pair once per interval
//! - [`PositionBook`]: per-pair hedge state, seeded from balances
//! - [`execute_legs`]: two-leg order sequence with a partial-execution outcome
//! - [`compute_spread`]: `(swap - spot) / spot`

pub mod engine;
pub mod execution;
pub mod positions;
pub mod spread;

pub use engine::{decide, PairOutcome, SkipReason, SpreadEngine};
pub use execution::{execute_legs, ExecutionError, HedgeAction, LegAcks};
pub use positions::{PositionBook, PositionState};
pub use spread::compute_spread;
