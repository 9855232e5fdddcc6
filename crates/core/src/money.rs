//! Monetary tolerance and rounding helpers.
//!
//! The two-decimal balancing epsilon is a single shared constant: the journal
//! validator, the trial balance and the statement assembler must all agree on
//! what "balanced" means.

use rust_decimal::{Decimal, RoundingStrategy};

/// Maximum absolute debit/credit difference still considered balanced (0.01).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Whether a debit-minus-credit difference is within [`BALANCE_TOLERANCE`].
pub fn is_within_tolerance(diff: Decimal) -> bool {
    diff.abs() <= BALANCE_TOLERANCE
}

/// Round a monetary amount to two decimals for presentation totals.
///
/// Intermediate arithmetic keeps full precision; only totals handed to the
/// caller are rounded.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
