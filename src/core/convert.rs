//! Monetary rounding and pivot conversion arithmetic.
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to two decimal places, halves away from zero.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts `base` through the pivot unit: `base / rate_ref * rate_target`.
///
/// Both rates are the value of one pivot unit in minor units of the
/// reference and target currency. Only the final amount is rounded.
/// Returns `None` if `rate_ref` is not positive or the arithmetic overflows.
pub fn pivot_convert(base: Decimal, rate_ref: Decimal, rate_target: Decimal) -> Option<Decimal> {
    if rate_ref <= Decimal::ZERO {
        return None;
    }
    let pivot_amount = base.checked_div(rate_ref)?;
    pivot_amount.checked_mul(rate_target).map(round_amount)
}
