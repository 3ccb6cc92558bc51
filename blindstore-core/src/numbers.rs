//! Numeric parsing and conversion helpers centralizing money and quantity math.

use num_traits::ToPrimitive;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::constants::{MAX_QUANTITY, MIN_QUANTITY};

fn leading_number() -> Option<&'static Regex> {
    static LEADING: OnceLock<Option<Regex>> = OnceLock::new();
    LEADING
        .get_or_init(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d+)?|\.\d+)(?:[eE][+-]?\d+)?").ok())
        .as_ref()
}

/// Parse a raw dimension field from its leading number, so `"120cm"` reads as 120.
/// Blank input, input without a leading number, or a number too large to
/// represent is treated as absent.
#[must_use]
pub fn parse_dimension_input(raw: &str) -> Option<Decimal> {
    let number = leading_number()?.find(raw.trim())?.as_str();
    let plain = number.strip_prefix('+').unwrap_or(number);
    if plain.contains(['e', 'E']) {
        Decimal::from_scientific(plain).ok()
    } else {
        Decimal::from_str(plain).ok()
    }
}

/// Parse a raw quantity field, falling back to the minimum for non-numeric input.
#[must_use]
pub fn parse_quantity_input(raw: &str) -> u32 {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(value) if value > 0 => clamp_quantity(u32::try_from(value).unwrap_or(u32::MAX)),
        _ => MIN_QUANTITY,
    }
}

/// Clamp a quantity into `[MIN_QUANTITY, MAX_QUANTITY]`.
#[must_use]
pub const fn clamp_quantity(quantity: u32) -> u32 {
    if quantity < MIN_QUANTITY {
        MIN_QUANTITY
    } else if quantity > MAX_QUANTITY {
        MAX_QUANTITY
    } else {
        quantity
    }
}

/// Round a currency amount to cents, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a decimal to f64 for statistics, returning 0.0 when out of range.
#[must_use]
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
