use primitive_types::U256;
use serde::{Deserialize, Deserializer};
use starknet_core::types::Felt;
use starknet_core::utils::{get_selector_from_name, parse_cairo_short_string};

// 2^251 + 17 * 2^192 + 1
const FIELD_PRIME: U256 = U256([1, 0, 0, 0x0800_0000_0000_0011]);

/// Parses a `0x`-prefixed hex felt. Values at or above the field prime are
/// rejected rather than reduced.
pub fn parse_felt(s: &str) -> Result<Felt, FeltError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| FeltError::InvalidHex(s.to_string()))?;
    if digits.is_empty() {
        return Ok(Felt::ZERO);
    }

    let value = U256::from_str_radix(digits, 16).map_err(|_| FeltError::InvalidHex(s.to_string()))?;
    if value >= FIELD_PRIME {
        return Err(FeltError::OutOfRange(s.to_string()));
    }
    Felt::from_hex(&format!("0x{digits}")).map_err(|_| FeltError::InvalidHex(s.to_string()))
}

/// `deserialize_with` helper for config values that must be valid felts.
pub fn deserialize_felt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Felt, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_felt(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_optional_felt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Felt>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|s| parse_felt(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// `sn_keccak` of an entry point or event name.
pub fn selector(name: &str) -> Result<Felt, FeltError> {
    get_selector_from_name(name).map_err(|_| FeltError::NonAsciiName(name.to_string()))
}

/// Full-width address rendering (`0x` + 64 hex digits).
pub fn to_address_string(felt: &Felt) -> String {
    felt.to_fixed_hex_string()
}

pub fn to_u64(felt: &Felt) -> Result<u64, FeltError> {
    let value = U256::from_big_endian(&felt.to_bytes_be());
    if value > U256::from(u64::MAX) {
        return Err(FeltError::Overflow(format!("{felt:#x}")));
    }
    Ok(value.low_u64())
}

/// Decodes a chain id such as `SN_SEPOLIA`.
pub fn to_short_string(felt: &Felt) -> Result<String, FeltError> {
    parse_cairo_short_string(felt).map_err(|_| FeltError::NotAShortString(format!("{felt:#x}")))
}

/// Splits a u256 into its Cairo calldata representation `[low, high]`.
pub fn u256_to_felts(value: U256) -> [Felt; 2] {
    let low = value.low_u128();
    let high = (value >> 128).low_u128();
    [Felt::from(low), Felt::from(high)]
}

pub fn u256_from_felts(low: &Felt, high: &Felt) -> U256 {
    let low = U256::from_big_endian(&low.to_bytes_be());
    let high = U256::from_big_endian(&high.to_bytes_be());
    (high << 128) | low
}

#[derive(thiserror::Error, Debug)]
pub enum FeltError {
    #[error("Invalid felt hex string `{0}`")]
    InvalidHex(String),
    #[error("`{0}` is not below the field prime")]
    OutOfRange(String),
    #[error("Felt `{0}` does not fit into u64")]
    Overflow(String),
    #[error("Felt `{0}` is not a short string")]
    NotAShortString(String),
    #[error("`{0}` is not an ASCII name")]
    NonAsciiName(String),
}
