use rust_decimal::Decimal;

/// Relative spread of the swap over the spot price: `(swap - spot) / spot`
///
/// Positive when the swap trades at a premium. Returns `None` when the spot
/// price is not positive or the result does not fit a `Decimal`.
pub fn compute_spread(spot: Decimal, swap: Decimal) -> Option<Decimal> {
    if spot <= Decimal::ZERO {
        return None;
    }
    swap.checked_sub(spot)?.checked_div(spot)
}
