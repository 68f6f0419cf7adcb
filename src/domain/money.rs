//! Currency amounts are carried as integer minor units (cents).

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Renders minor units as a fixed two-decimal string: `12345` → `"123.45"`.
pub fn format_minor_units(minor_units: i64) -> String {
    Decimal::new(minor_units, 2).to_string()
}

/// Parses a user-entered price into minor units.
///
/// Blank input means "no price". Negative amounts and amounts with more
/// than two fractional digits are rejected.
pub fn parse_price(raw: &str) -> Result<Option<i64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let amount = Decimal::from_str(raw).map_err(|_| format!("invalid price: {raw}"))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(format!("price must not be negative: {raw}"));
    }
    if amount.normalize().scale() > 2 {
        return Err(format!("price has more than two decimal places: {raw}"));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.trunc().to_i64())
        .map(Some)
        .ok_or_else(|| format!("price out of range: {raw}"))
}
