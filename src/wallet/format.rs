//! Display formatting for addresses and balances.

use alloy::primitives::U256;

use crate::transactions::units::format_ether_rounded;

/// Shorten an address to its first six and last four characters,
/// `0x1234...abcd`.
///
/// Inputs of ten characters or fewer would not get shorter and come back
/// unchanged, as does non-ASCII text.
pub fn format_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Balance in ether rounded to `places` decimals.
pub fn format_balance(wei: U256, places: u32) -> String {
    format_ether_rounded(wei, places)
}
