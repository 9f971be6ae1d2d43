//! Exact decimal helpers for currency values.
//!
//! Every monetary amount in the system is a [`Decimal`]. Accumulation happens
//! at full precision and rounding to cents happens once, when a value leaves
//! the engine as a report figure.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso};

/// Number of decimal places reported to clients.
pub const REPORT_SCALE: u32 = 2;

/// Rounds an accumulated amount to two decimal places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(REPORT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Relative change of `current` against `previous`, in percent.
///
/// Returns `None` when there is no previous value to compare against.
pub fn percentage_change(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    let change = (current - previous) / previous * Decimal::ONE_HUNDRED;
    Some(round_money(change))
}

/// Human-readable form of an amount in Ethiopian Birr, used in log lines.
pub fn display_amount(amount: Decimal) -> String {
    Money::from_decimal(round_money(amount), iso::ETB).to_string()
}
