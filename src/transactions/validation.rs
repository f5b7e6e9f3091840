//! Recipient and amount validation.

use alloy::primitives::{Address, U256};

use crate::error::ValidationError;
use crate::transactions::units::parse_ether_amount;

/// Parse an account identifier the way wallets do.
///
/// Forty hex digits with an optional `0x` prefix. Mixed-case input must carry
/// a valid EIP-55 checksum; all-lowercase or all-uppercase input carries no
/// checksum and is accepted as is.
pub fn parse_address(input: &str) -> Option<Address> {
    let hex = input.strip_prefix("0x").unwrap_or(input);
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    let prefixed = format!("0x{hex}");
    if has_lower && has_upper {
        Address::parse_checksummed(&prefixed, None).ok()
    } else {
        prefixed.parse().ok()
    }
}

/// Whether `input` is a well-formed, checksum-consistent address.
pub fn validate_address(input: &str) -> bool {
    parse_address(input).is_some()
}

/// Parse a strictly positive ether amount into wei.
pub fn validate_amount(input: &str) -> Result<U256, ValidationError> {
    let wei = parse_ether_amount(input)?;
    if wei.is_zero() {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(wei)
}

/// Validate a recipient/amount pair.
pub fn validate_transfer(to: &str, value_eth: &str) -> Result<(Address, U256), ValidationError> {
    let to = parse_address(to).ok_or(ValidationError::InvalidAddress)?;
    let wei = validate_amount(value_eth)?;
    Ok((to, wei))
}
