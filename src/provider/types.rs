//! Gateway-level types: RPC methods, provider events and provider errors.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193 code for a method the dapp is not authorized to call.
pub const UNAUTHORIZED_CODE: i64 = 4100;
/// Code wallets return while an identical prompt is already open.
pub const REQUEST_PENDING_CODE: i64 = -32002;
/// JSON-RPC internal error.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Receipt `status` value for a successful transaction.
pub const RECEIPT_SUCCESS: &str = "0x1";

/// RPC methods the shell calls on the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    RequestAccounts,
    Accounts,
    GetBalance,
    ChainId,
    EstimateGas,
    GasPrice,
    SendTransaction,
    GetTransactionReceipt,
}

impl RpcMethod {
    /// Wire name of the method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequestAccounts => "eth_requestAccounts",
            Self::Accounts => "eth_accounts",
            Self::GetBalance => "eth_getBalance",
            Self::ChainId => "eth_chainId",
            Self::EstimateGas => "eth_estimateGas",
            Self::GasPrice => "eth_gasPrice",
            Self::SendTransaction => "eth_sendTransaction",
            Self::GetTransactionReceipt => "eth_getTransactionReceipt",
        }
    }

    /// Whether the wallet may show a prompt and wait on the user.
    pub const fn prompts_user(self) -> bool {
        matches!(self, Self::RequestAccounts | Self::SendTransaction)
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The set of exposed accounts changed; empty means the wallet locked or
    /// revoked access.
    AccountsChanged(Vec<Address>),
    /// The active chain changed (hex chain id).
    ChainChanged(String),
}

/// Errors raised by a provider gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider answered with a JSON-RPC / EIP-1193 error.
    #[error("{message}")]
    Rpc { code: i64, message: String },

    /// A non-prompting call did not answer in time.
    #[error("{method} timed out after {secs} seconds")]
    Timeout { method: RpcMethod, secs: u64 },

    /// The provider answered with something we could not interpret.
    #[error("Malformed {method} response: {reason}")]
    Malformed { method: RpcMethod, reason: String },

    /// Transport-level failure (connection refused, DNS, ...).
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::rpc(USER_REJECTED_CODE, "User rejected the request.")
    }

    /// Numeric code when the provider supplied one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    fn malformed(method: RpcMethod, reason: impl Into<String>) -> Self {
        Self::Malformed {
            method,
            reason: reason.into(),
        }
    }
}

/// Transaction object in the shape `eth_sendTransaction` / `eth_estimateGas`
/// expect: quantities as `0x`-prefixed hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// The parts of a receipt the shell cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
}

impl ReceiptSummary {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some(RECEIPT_SUCCESS)
    }

    /// Gas used, when present and well formed.
    pub fn gas_used(&self) -> Option<u64> {
        let raw = self.gas_used.as_deref()?;
        u64::from_str_radix(raw.trim_start_matches("0x"), 16).ok()
    }
}

/// Encode a quantity the way providers expect (`0x0`, `0x5208`, ...).
pub fn to_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

/// Decode a hex quantity response.
pub fn parse_quantity(method: RpcMethod, value: &Value) -> Result<U256, ProviderError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ProviderError::malformed(method, format!("expected hex string, got {value}")))?;
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| ProviderError::malformed(method, format!("missing 0x prefix in {raw}")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::malformed(method, format!("{raw}: {e}")))
}

/// Decode an account list response.
pub fn parse_accounts(method: RpcMethod, value: Value) -> Result<Vec<Address>, ProviderError> {
    let raw: Vec<String> = serde_json::from_value(value)
        .map_err(|e| ProviderError::malformed(method, e.to_string()))?;
    raw.iter()
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| ProviderError::malformed(method, format!("{s}: {e}")))
        })
        .collect()
}

/// Decode a string response (chain id, transaction hash).
pub fn parse_string(method: RpcMethod, value: Value) -> Result<String, ProviderError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(ProviderError::malformed(
            method,
            format!("expected string, got {other}"),
        )),
    }
}

/// Decode a receipt response; `null` means not yet mined.
pub fn parse_receipt(value: Value) -> Result<Option<ReceiptSummary>, ProviderError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| ProviderError::malformed(RpcMethod::GetTransactionReceipt, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quantity_encoding() {
        assert_eq!(to_quantity(U256::ZERO), "0x0");
        assert_eq!(to_quantity(U256::from(21_000u64)), "0x5208");
        assert_eq!(
            parse_quantity(RpcMethod::GasPrice, &json!("0x5208")).unwrap(),
            U256::from(21_000u64)
        );
        assert_eq!(
            parse_quantity(RpcMethod::GasPrice, &json!("0x")).unwrap(),
            U256::ZERO
        );
        assert!(parse_quantity(RpcMethod::GasPrice, &json!(21000)).is_err());
        assert!(parse_quantity(RpcMethod::GasPrice, &json!("5208")).is_err());
    }

    #[test]
    fn test_payload_skips_absent_fields() {
        let payload = TxPayload {
            to: "0xabc".into(),
            value: "0x1".into(),
            gas_price: Some("0x2".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, json!({"to": "0xabc", "value": "0x1", "gasPrice": "0x2"}));
    }

    #[test]
    fn test_receipt_parsing() {
        assert_eq!(parse_receipt(Value::Null).unwrap(), None);

        let receipt = parse_receipt(json!({"status": "0x1", "gasUsed": "0x5208"}))
            .unwrap()
            .unwrap();
        assert!(receipt.succeeded());
        assert_eq!(receipt.gas_used(), Some(21_000));

        let reverted = parse_receipt(json!({"status": "0x0"})).unwrap().unwrap();
        assert!(!reverted.succeeded());
        assert_eq!(reverted.gas_used(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::rpc(4001, "User rejected the request.");
        assert_eq!(err.code(), Some(4001));
        assert_eq!(err.to_string(), "User rejected the request.");

        let err = ProviderError::Timeout {
            method: RpcMethod::ChainId,
            secs: 10,
        };
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "eth_chainId timed out after 10 seconds");
    }
}
