use crate::error::AnalyzerError;
use alloy_primitives::Address;
use std::str::FromStr;

/// Validates a candidate contract address: `0x` followed by exactly 40 hex
/// digits. Uniformly-cased hex is normalized; mixed case must be a valid
/// EIP-55 checksum. Performs no extraction and no network access.
pub fn validate(raw: &str) -> Result<Address, AnalyzerError> {
    let invalid = || AnalyzerError::InvalidAddress(raw.to_string());

    let hex = raw.strip_prefix("0x").ok_or_else(invalid)?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(raw, None).map_err(|_| invalid())
    } else {
        Address::from_str(raw).map_err(|_| invalid())
    }
}
