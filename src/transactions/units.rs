//! Ether ↔ wei conversion.
//!
//! Wire values are integers in wei; conversion from the user's decimal text is
//! exact. Rounding exists only in [`format_ether_rounded`], which is for
//! display and never feeds back into a wire value.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::U256;

use crate::error::ValidationError;

/// Decimal places of the native currency.
pub const ETHER_DECIMALS: u32 = 18;

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Parse a non-negative decimal ether string into wei.
///
/// Accepts `1`, `1.5`, `.5`, `5.`; rejects signs, exponents, separators and
/// more than 18 fractional digits.
pub fn parse_ether_amount(input: &str) -> Result<U256, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required("Amount"));
    }

    let (int_part, frac_part) = match input.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (input, ""),
    };
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(int_part) || !digits_only(frac_part) || (int_part.is_empty() && frac_part.is_empty()) {
        return Err(ValidationError::InvalidAmount(input.to_string()));
    }

    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.len() > ETHER_DECIMALS as usize {
        return Err(ValidationError::InvalidAmount(format!(
            "{input} has more than {ETHER_DECIMALS} decimal places"
        )));
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let normalized = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    };

    parse_ether(&normalized).map_err(|e| ValidationError::InvalidAmount(format!("{input}: {e}")))
}

/// Exact decimal rendering of `wei` in ether, trailing zeros trimmed
/// (`0.0`, `1.0`, `0.00042`).
pub fn format_ether_exact(wei: U256) -> String {
    let unit = pow10(ETHER_DECIMALS);
    let whole = wei / unit;
    let frac = wei % unit;
    if frac.is_zero() {
        return format!("{whole}.0");
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = ETHER_DECIMALS as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Render `wei` in ether rounded half-up to `places` decimals.
pub fn format_ether_rounded(wei: U256, places: u32) -> String {
    let places = places.min(ETHER_DECIMALS);
    let step = pow10(ETHER_DECIMALS - places);
    let scaled = wei.saturating_add(step / U256::from(2u64)) / step;

    let scale = pow10(places);
    let whole = scaled / scale;
    if places == 0 {
        return whole.to_string();
    }
    let frac = scaled % scale;
    format!(
        "{whole}.{:0>width$}",
        frac.to_string(),
        width = places as usize
    )
}
