//! Decision loop scenarios against an in-memory trading client

mod common;

use chrono::Utc;
use common::{balances, btc_pair, doge_pair, RecordingClient};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spread_arbitrage::common::types::{PositionSide, Side, TradeMode};
use spread_arbitrage::strategy::{
    HedgeAction, PairOutcome, PositionBook, PositionState, SkipReason, SpreadEngine,
};
use spread_arbitrage::{PriceCache, TradingPairConfig};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    client: Arc<RecordingClient>,
    cache: PriceCache,
    engine: SpreadEngine,
}

fn harness(pairs: Vec<TradingPairConfig>, positions: PositionBook) -> Harness {
    let client = Arc::new(RecordingClient::new());
    let cache = PriceCache::new();
    let engine = SpreadEngine::new(client.clone(), cache.reader(), pairs, positions);
    Harness {
        client,
        cache,
        engine,
    }
}

fn book(entries: &[(TradingPairConfig, PositionState)]) -> PositionBook {
    let mut book = PositionBook::new();
    for (pair, state) in entries {
        book.set(pair.key(), *state);
    }
    book
}

async fn quote(cache: &PriceCache, pair: &TradingPairConfig, spot: Decimal, swap: Decimal) {
    cache.put(&pair.spot, spot, Utc::now()).await;
    cache.put(&pair.swap, swap, Utc::now()).await;
}

#[tokio::test]
async fn test_missing_quote_skips_without_orders() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], book(&[(pair.clone(), PositionState::Closed)]));

    // Only the spot leg has ticked
    h.cache.put(&pair.spot, dec!(100), Utc::now()).await;

    let outcomes = h.engine.run_cycle().await;
    assert_eq!(outcomes, vec![PairOutcome::Skipped(SkipReason::MissingQuote)]);
    assert!(h.client.orders().is_empty());
    assert_eq!(h.engine.positions().get(&pair.key()), PositionState::Closed);
}

#[tokio::test]
async fn test_zero_spot_price_is_skipped() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], PositionBook::new());
    quote(&h.cache, &pair, Decimal::ZERO, dec!(1)).await;

    let outcomes = h.engine.run_cycle().await;
    assert_eq!(outcomes, vec![PairOutcome::Skipped(SkipReason::UndefinedSpread)]);
    assert!(h.client.orders().is_empty());
}

#[tokio::test]
async fn test_corrupt_quotes_are_skipped_without_panicking() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], PositionBook::new());

    quote(&h.cache, &pair, dec!(-1), Decimal::MAX).await;
    let outcomes = h.engine.run_cycle().await;
    assert_eq!(outcomes, vec![PairOutcome::Skipped(SkipReason::UndefinedSpread)]);

    quote(&h.cache, &pair, dec!(0.0000000000000000000000000001), Decimal::MAX).await;
    let outcomes = h.engine.run_cycle().await;
    assert_eq!(outcomes, vec![PairOutcome::Skipped(SkipReason::UndefinedSpread)]);

    assert!(h.client.orders().is_empty());
    assert_eq!(h.engine.positions().get(&pair.key()), PositionState::Closed);
}

#[tokio::test]
async fn test_spread_above_open_threshold_opens_hedge() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], book(&[(pair.clone(), PositionState::Closed)]));
    quote(&h.cache, &pair, dec!(100), dec!(101.2)).await;

    let outcomes = h.engine.run_cycle().await;
    assert!(matches!(
        &outcomes[0],
        PairOutcome::Opened { spread, .. } if *spread == dec!(0.012)
    ));
    assert_eq!(h.engine.positions().get(&pair.key()), PositionState::Open);

    let orders = h.client.orders();
    assert_eq!(orders.len(), 2);

    assert_eq!(orders[0].inst_id, "DOGE-USDT");
    assert_eq!(orders[0].side, Side::Buy);
    assert_eq!(orders[0].trade_mode, TradeMode::Cash);
    assert_eq!(orders[0].size, dec!(100));

    assert_eq!(orders[1].inst_id, "DOGE-USDT-SWAP");
    assert_eq!(orders[1].side, Side::Sell);
    assert_eq!(orders[1].trade_mode, TradeMode::Cross);
    assert_eq!(orders[1].position_side, Some(PositionSide::Short));
    assert_eq!(orders[1].size, dec!(1));
}

#[tokio::test]
async fn test_spread_below_close_threshold_closes_hedge() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], book(&[(pair.clone(), PositionState::Open)]));
    quote(&h.cache, &pair, dec!(100), dec!(100.2)).await;

    let outcomes = h.engine.run_cycle().await;
    assert!(matches!(
        &outcomes[0],
        PairOutcome::Closed { spread, .. } if *spread == dec!(0.002)
    ));
    assert_eq!(h.engine.positions().get(&pair.key()), PositionState::Closed);

    let orders = h.client.orders();
    assert_eq!(orders.len(), 2);
    assert_eq!(
        (orders[0].inst_id.as_str(), orders[0].side, orders[0].trade_mode),
        ("DOGE-USDT", Side::Sell, TradeMode::Cash)
    );
    assert_eq!(
        (orders[1].inst_id.as_str(), orders[1].side, orders[1].trade_mode),
        ("DOGE-USDT-SWAP", Side::Buy, TradeMode::Cross)
    );
    assert_eq!(orders[1].position_side, Some(PositionSide::Short));
}

#[tokio::test]
async fn test_spread_inside_band_holds() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], book(&[(pair.clone(), PositionState::Open)]));
    quote(&h.cache, &pair, dec!(100), dec!(100.5)).await;

    let outcomes = h.engine.run_cycle().await;
    assert_eq!(outcomes, vec![PairOutcome::Held { spread: dec!(0.005) }]);
    assert!(h.client.orders().is_empty());
    assert_eq!(h.engine.positions().get(&pair.key()), PositionState::Open);
}

#[tokio::test]
async fn test_open_then_hold_then_close_over_cycles() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], PositionBook::new());

    quote(&h.cache, &pair, dec!(100), dec!(101.5)).await;
    h.engine.run_cycle().await;
    // Still above the open threshold but already open
    h.engine.run_cycle().await;
    assert_eq!(h.client.orders().len(), 2);

    quote(&h.cache, &pair, dec!(100), dec!(100.1)).await;
    h.engine.run_cycle().await;
    assert_eq!(h.client.orders().len(), 4);
    assert_eq!(h.engine.positions().get(&pair.key()), PositionState::Closed);
}

#[tokio::test]
async fn test_seeded_positions_drive_first_decision() {
    let pair = doge_pair();
    let seeded = PositionBook::initialize(
        &[pair.clone()],
        &balances(&[("DOGE", dec!(5)), ("USDT", dec!(1000))]),
    );
    assert!(seeded.is_open(&pair.key()));

    let closed = PositionBook::initialize(&[pair.clone()], &balances(&[("DOGE", dec!(0.5))]));
    assert_eq!(closed.get(&pair.key()), PositionState::Closed);

    let mut h = harness(vec![pair.clone()], seeded);
    quote(&h.cache, &pair, dec!(100), dec!(100.1)).await;

    let outcomes = h.engine.run_cycle().await;
    assert!(matches!(outcomes[0], PairOutcome::Closed { .. }));
}

#[tokio::test]
async fn test_first_leg_failure_leaves_state_unchanged() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], book(&[(pair.clone(), PositionState::Closed)]));
    h.client.fail_orders_for("DOGE-USDT");
    quote(&h.cache, &pair, dec!(100), dec!(102)).await;

    let outcomes = h.engine.run_cycle().await;
    assert!(matches!(
        outcomes[0],
        PairOutcome::LegRejected {
            action: HedgeAction::Open,
            ..
        }
    ));
    assert_eq!(h.client.orders().len(), 1);
    assert_eq!(h.engine.positions().get(&pair.key()), PositionState::Closed);

    // Retried on the next cycle once the exchange accepts orders again
    h.client.clear_failures();
    let outcomes = h.engine.run_cycle().await;
    assert!(matches!(outcomes[0], PairOutcome::Opened { .. }));
    assert_eq!(h.client.orders().len(), 3);
}

#[tokio::test]
async fn test_failed_short_keeps_pair_out_of_trading_until_account_agrees() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], book(&[(pair.clone(), PositionState::Closed)]));
    h.client.fail_orders_for("DOGE-USDT-SWAP");
    quote(&h.cache, &pair, dec!(100), dec!(102)).await;

    let outcomes = h.engine.run_cycle().await;
    assert!(matches!(
        outcomes[0],
        PairOutcome::PartiallyExecuted {
            action: HedgeAction::Open,
            ..
        }
    ));
    assert_eq!(h.client.orders().len(), 2);
    assert_eq!(
        h.engine.positions().get(&pair.key()),
        PositionState::Indeterminate
    );

    // Account queries fail: stays indeterminate, no orders
    let outcomes = h.engine.run_cycle().await;
    assert_eq!(
        outcomes,
        vec![PairOutcome::Skipped(SkipReason::AccountUnavailable)]
    );
    assert_eq!(
        h.engine.positions().get(&pair.key()),
        PositionState::Indeterminate
    );

    // Spot filled, no short on the swap: one-sided, still held
    h.client.clear_failures();
    h.client
        .set_balances(Some(balances(&[("DOGE", dec!(100)), ("USDT", dec!(900))])));
    let outcomes = h.engine.run_cycle().await;
    assert_eq!(
        outcomes,
        vec![PairOutcome::Skipped(SkipReason::UnhedgedExposure)]
    );
    assert_eq!(h.client.orders().len(), 2);
    assert_eq!(
        h.engine.positions().get(&pair.key()),
        PositionState::Indeterminate
    );

    // Operator places the missing short by hand
    h.client.set_short("DOGE-USDT-SWAP", dec!(1));
    let outcomes = h.engine.run_cycle().await;
    assert_eq!(outcomes, vec![PairOutcome::Reconciled(PositionState::Open)]);
    assert_eq!(h.client.orders().len(), 2);
    assert_eq!(h.client.balance_calls(), 3);
    assert_eq!(h.engine.positions().get(&pair.key()), PositionState::Open);
}

#[tokio::test]
async fn test_failed_cover_never_opens_a_second_short() {
    let pair = doge_pair();
    let mut h = harness(vec![pair.clone()], book(&[(pair.clone(), PositionState::Open)]));
    h.client.set_short("DOGE-USDT-SWAP", dec!(1));
    h.client.fail_orders_for("DOGE-USDT-SWAP");

    quote(&h.cache, &pair, dec!(100), dec!(100.1)).await;
    let outcomes = h.engine.run_cycle().await;
    assert!(matches!(
        outcomes[0],
        PairOutcome::PartiallyExecuted {
            action: HedgeAction::Close,
            ..
        }
    ));
    assert_eq!(h.client.short("DOGE-USDT-SWAP"), dec!(1));

    // Spot sold but the short is still on the books
    h.client.set_balances(Some(balances(&[("DOGE", dec!(0.5))])));
    let outcomes = h.engine.run_cycle().await;
    assert_eq!(
        outcomes,
        vec![PairOutcome::Skipped(SkipReason::UnhedgedExposure)]
    );
    assert_eq!(
        h.engine.positions().get(&pair.key()),
        PositionState::Indeterminate
    );

    // Exchange recovers and the spread crosses the open threshold again
    h.client.clear_failures();
    quote(&h.cache, &pair, dec!(100), dec!(102)).await;
    let outcomes = h.engine.run_cycle().await;
    assert_eq!(
        outcomes,
        vec![PairOutcome::Skipped(SkipReason::UnhedgedExposure)]
    );
    let short_sells: Vec<_> = h
        .client
        .orders_for("DOGE-USDT-SWAP")
        .into_iter()
        .filter(|o| o.side == Side::Sell)
        .collect();
    assert!(short_sells.is_empty());
    assert_eq!(h.client.short("DOGE-USDT-SWAP"), dec!(1));

    // Once the short is covered by hand the pair resolves closed and trades again
    h.client.set_short("DOGE-USDT-SWAP", Decimal::ZERO);
    let outcomes = h.engine.run_cycle().await;
    assert_eq!(outcomes, vec![PairOutcome::Reconciled(PositionState::Closed)]);

    let outcomes = h.engine.run_cycle().await;
    assert!(matches!(outcomes[0], PairOutcome::Opened { .. }));
    assert_eq!(h.client.short("DOGE-USDT-SWAP"), dec!(1));
}

#[tokio::test]
async fn test_one_pair_failing_does_not_stop_others() {
    let doge = doge_pair();
    let btc = btc_pair();
    let mut h = harness(
        vec![btc.clone(), doge.clone()],
        book(&[
            (btc.clone(), PositionState::Closed),
            (doge.clone(), PositionState::Closed),
        ]),
    );
    h.client.fail_orders_for("BTC-USDT");
    quote(&h.cache, &btc, dec!(42000), dec!(43000)).await;
    quote(&h.cache, &doge, dec!(100), dec!(102)).await;

    let outcomes = h.engine.run_cycle().await;
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(outcomes[0], PairOutcome::LegRejected { .. }));
    assert!(matches!(outcomes[1], PairOutcome::Opened { .. }));

    assert_eq!(h.engine.positions().get(&btc.key()), PositionState::Closed);
    assert_eq!(h.engine.positions().get(&doge.key()), PositionState::Open);
    assert_eq!(h.client.orders_for("BTC-USDT-SWAP").len(), 0);
    assert_eq!(h.client.orders_for("DOGE-USDT-SWAP").len(), 1);
}

#[tokio::test]
async fn test_run_loop_trades_once_per_crossing() {
    let pair = doge_pair();
    let client = Arc::new(RecordingClient::new());
    let cache = PriceCache::new();
    quote(&cache, &pair, dec!(100), dec!(105)).await;

    let engine = SpreadEngine::new(
        client.clone(),
        cache.reader(),
        vec![pair.clone()],
        PositionBook::new(),
    )
    .with_interval(Duration::from_millis(10));
    let handle = tokio::spawn(engine.run());

    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.abort();

    assert_eq!(client.orders().len(), 2);
}
