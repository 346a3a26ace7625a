use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_traits::{Signed, Zero};
use primitive_types::U256;

pub const DEFAULT_ELLIPSIS_LEN: usize = 4;

/// STRK uses 18 decimals.
pub const TOKEN_DECIMALS: u32 = 18;

/// Shortens `s` to its first `len + 2` and last `len` characters.
pub fn ellipsify(s: &str, len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= len {
        return s.to_string();
    }
    if len == 0 {
        return "...".to_string();
    }

    let head: String = chars.iter().take(len + 2).collect();
    let tail: String = chars[chars.len() - len..].iter().collect();
    format!("{head}...{tail}")
}

/// Renders a base-unit amount with `places` fractional digits, rounding half up.
pub fn format_token_amount(value: U256, decimals: u32, places: u32) -> String {
    let places = places.min(decimals);
    let divisor = U256::exp10((decimals - places) as usize);
    let mut scaled = value / divisor;
    if divisor > U256::one() && value % divisor >= divisor / 2 {
        scaled += U256::one();
    }

    let unit = U256::exp10(places as usize);
    let whole = scaled / unit;
    if places == 0 {
        return whole.to_string();
    }
    let fraction = (scaled % unit).to_string();
    format!("{whole}.{fraction:0>width$}", width = places as usize)
}

/// Parses a decimal token amount (`"1.5"`) into base units.
pub fn parse_token_amount(input: &str, decimals: u32) -> Result<U256, AmountError> {
    let amount = BigDecimal::from_str(input.trim())
        .map_err(|_| AmountError::NotANumber(input.to_string()))?;
    if amount.is_negative() {
        return Err(AmountError::Negative(input.to_string()));
    }
    if amount.is_zero() {
        return Ok(U256::zero());
    }

    let (units, _) = amount.with_scale(decimals as i64).into_bigint_and_exponent();
    U256::from_dec_str(&units.to_string()).map_err(|_| AmountError::TooLarge(input.to_string()))
}

#[derive(thiserror::Error, Debug)]
pub enum AmountError {
    #[error("`{0}` is not a decimal amount")]
    NotANumber(String),
    #[error("Amount `{0}` is negative")]
    Negative(String),
    #[error("Amount `{0}` does not fit into u256")]
    TooLarge(String),
}
