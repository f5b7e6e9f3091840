//! Observable wallet session state.

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::error::WalletError;
use crate::transactions::units::format_ether_exact;
use crate::wallet::chains::chain_display_name;
use crate::wallet::format::{format_address, format_balance};

/// Snapshot of the wallet connection.
///
/// When `connected` is false, `address`, `balance_wei` and `chain_id` are
/// all `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    pub connected: bool,
    pub address: Option<Address>,
    pub balance_wei: Option<U256>,
    /// Hex chain id as reported by the wallet (`0x1`).
    pub chain_id: Option<String>,
    pub loading: bool,
    pub error: Option<WalletError>,
}

impl WalletSession {
    /// Lowercase hex address, as wallets report it.
    pub fn address_hex(&self) -> Option<String> {
        self.address.map(|a| a.to_string().to_lowercase())
    }

    pub fn balance_display(&self, places: u32) -> Option<String> {
        self.balance_wei.map(|wei| format_balance(wei, places))
    }

    pub fn chain_name(&self) -> Option<String> {
        self.chain_id.as_deref().map(chain_display_name)
    }

    /// Whether the connected/disconnected field rules hold.
    pub fn is_consistent(&self) -> bool {
        if self.connected {
            self.address.is_some()
        } else {
            self.address.is_none() && self.balance_wei.is_none() && self.chain_id.is_none()
        }
    }
}

/// Profile produced by a successful wallet connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3User {
    /// Lowercase hex address.
    pub address: String,
    /// Balance in ether, exact.
    pub balance: String,
    pub chain_id: String,
    /// Shortened address used as the display name.
    pub name: String,
}

impl Web3User {
    pub fn new(address: Address, balance_wei: U256, chain_id: String) -> Self {
        let address = address.to_string().to_lowercase();
        Self {
            name: format_address(&address),
            address,
            balance: format_ether_exact(balance_wei),
            chain_id,
        }
    }
}
