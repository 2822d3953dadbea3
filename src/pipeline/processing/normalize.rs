//! Conversion of loosely formatted page text into typed values.

use crate::types::Price;

/// Digit runs up to this length are read as hundredths.
const MINOR_UNIT_MAX_DIGITS: usize = 3;

/// Normalize raw price text into a [`Price`].
///
/// Every non-digit character is dropped. What remains is interpreted with a
/// site-specific heuristic: the listing site renders small prices with their
/// cents run together (`"45"` is 0.45) and large prices as whole units with no
/// fractional part (`"1.042.634"` is 1042634.00). So up to three digits are
/// hundredths, and longer runs are whole units.
///
/// This is an approximation, not a currency parser. A genuine whole amount
/// below 10 (`"5"`) reads as 0.05, and cents on a four-digit-or-longer amount
/// are folded into the whole part.
///
/// Text without digits yields 0.00. Runs too large for the price type saturate.
pub fn normalize_price(raw: &str) -> Price {
    let digits: Vec<u64> = raw
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(u64::from)
        .collect();

    if digits.is_empty() {
        return Price::ZERO;
    }

    let value = digits
        .iter()
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(*d));

    if digits.len() <= MINOR_UNIT_MAX_DIGITS {
        Price::from_cents(value)
    } else {
        Price::from_units(value)
    }
}

/// Collapse line breaks into spaces and trim; `None` when nothing is left.
pub fn normalize_name(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace(['\n', '\r'], " ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
