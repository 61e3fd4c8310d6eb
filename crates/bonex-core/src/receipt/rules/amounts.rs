//! Comma-decimal numeric token handling.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a comma-decimal token (e.g. "1,95") into a `Decimal`.
///
/// Returns `None` for malformed tokens; callers fall back to their safe
/// defaults instead of aborting the line.
pub fn parse_comma_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(&s.trim().replace(',', ".")).ok()
}

/// Round to cents, midpoint to nearest even.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}
