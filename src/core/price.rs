//! Grand Exchange price text normalization

use crate::core::error::FormatError;
use rust_decimal::{Decimal, prelude::*};

/// Largest price the exchange can hold: one full stack of coins.
pub const MAX_PRICE: i64 = 2_147_483_647;

/// Parses a catalogue price such as `"2.3k"`, `"1.5m"` or `"1,234"` into coins.
///
/// Suffixed values are parsed as exact decimals, scaled and truncated toward
/// zero, so `"2.999k"` is 2999 rather than 3000 and `"2.01k"` is exactly 2010.
/// Unsuffixed values must be whole numbers and may contain `,` thousands
/// separators. Prices above [`MAX_PRICE`] are rejected.
pub fn parse_price(raw: &str) -> Result<i64, FormatError> {
    let trimmed = raw.trim();
    let Some(last) = trimmed.chars().last() else {
        return Err(FormatError::new(raw, "empty price"));
    };

    let scale = match last {
        'k' => Decimal::ONE_THOUSAND,
        'm' => Decimal::from(1_000_000),
        c if c.is_ascii_digit() => return parse_whole(raw, trimmed),
        _ => return Err(FormatError::new(raw, "unrecognized suffix")),
    };

    let number = trimmed[..trimmed.len() - 1].replace(',', "");
    let value = Decimal::from_str(&number)
        .map_err(|_| FormatError::new(raw, "not a decimal number"))?;

    let coins = value
        .checked_mul(scale)
        .and_then(|scaled| scaled.trunc().to_i64())
        .ok_or_else(|| FormatError::new(raw, "price is out of range"))?;
    check_range(raw, coins)
}

fn parse_whole(raw: &str, trimmed: &str) -> Result<i64, FormatError> {
    let value: i64 = trimmed
        .replace(',', "")
        .parse()
        .map_err(|_| FormatError::new(raw, "not a whole number"))?;
    check_range(raw, value)
}

/// Accepts only `0..=MAX_PRICE`.
pub(crate) fn check_range(raw: &str, coins: i64) -> Result<i64, FormatError> {
    if coins < 0 {
        return Err(FormatError::new(raw, "price must be a non-negative number"));
    }
    if coins > MAX_PRICE {
        return Err(FormatError::new(raw, "price is out of range"));
    }
    Ok(coins)
}
