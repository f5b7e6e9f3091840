//! Typed wallet RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Encode parameters and decode results for each RPC method
//! - Bound non-prompting calls with a timeout
//! - Log and count provider failures at the boundary

use alloy::primitives::{Address, U256};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::observability::metrics;
use crate::provider::types::{
    parse_accounts, parse_quantity, parse_receipt, parse_string, ProviderError, ProviderEvent,
    ReceiptSummary, RpcMethod, TxPayload,
};
use crate::provider::ProviderGateway;

/// Typed wrapper around a [`ProviderGateway`].
#[derive(Clone)]
pub struct WalletClient {
    gateway: Arc<dyn ProviderGateway>,
    /// Timeout for calls that never wait on the user.
    timeout_duration: Option<Duration>,
}

impl WalletClient {
    /// Create a client without a call timeout.
    pub fn new(gateway: Arc<dyn ProviderGateway>) -> Self {
        Self {
            gateway,
            timeout_duration: None,
        }
    }

    /// Bound non-prompting calls by `duration`.
    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = Some(duration);
        self
    }

    pub fn is_available(&self) -> bool {
        self.gateway.is_available()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.gateway.subscribe()
    }

    async fn call(&self, method: RpcMethod, params: Value) -> Result<Value, ProviderError> {
        let fut = self.gateway.request(method, params);
        let result = match self.timeout_duration {
            Some(duration) if !method.prompts_user() => match timeout(duration, fut).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout {
                    method,
                    secs: duration.as_secs(),
                }),
            },
            _ => fut.await,
        };

        if let Err(e) = &result {
            tracing::warn!(method = %method, code = ?e.code(), error = %e, "Provider request failed");
            metrics::record_provider_error(method.as_str(), e.code());
        }
        result
    }

    /// Ask the wallet to expose its accounts (may prompt).
    pub async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.call(RpcMethod::RequestAccounts, json!([])).await?;
        parse_accounts(RpcMethod::RequestAccounts, value)
    }

    /// Accounts already exposed to us, without prompting.
    pub async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.call(RpcMethod::Accounts, json!([])).await?;
        parse_accounts(RpcMethod::Accounts, value)
    }

    /// Balance of `address` at the latest block, in wei.
    pub async fn get_balance(&self, address: Address) -> Result<U256, ProviderError> {
        let value = self
            .call(RpcMethod::GetBalance, json!([address, "latest"]))
            .await?;
        parse_quantity(RpcMethod::GetBalance, &value)
    }

    /// Hex chain id of the active network.
    pub async fn chain_id(&self) -> Result<String, ProviderError> {
        let value = self.call(RpcMethod::ChainId, json!([])).await?;
        parse_string(RpcMethod::ChainId, value)
    }

    pub async fn estimate_gas(&self, tx: &TxPayload) -> Result<U256, ProviderError> {
        let value = self.call(RpcMethod::EstimateGas, json!([tx])).await?;
        parse_quantity(RpcMethod::EstimateGas, &value)
    }

    pub async fn gas_price(&self) -> Result<U256, ProviderError> {
        let value = self.call(RpcMethod::GasPrice, json!([])).await?;
        parse_quantity(RpcMethod::GasPrice, &value)
    }

    /// Submit a transaction for signing; returns its hash.
    pub async fn send_transaction(&self, tx: &TxPayload) -> Result<String, ProviderError> {
        let value = self.call(RpcMethod::SendTransaction, json!([tx])).await?;
        parse_string(RpcMethod::SendTransaction, value)
    }

    pub async fn get_transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<ReceiptSummary>, ProviderError> {
        let value = self
            .call(RpcMethod::GetTransactionReceipt, json!([hash]))
            .await?;
        parse_receipt(value)
    }
}

impl std::fmt::Debug for WalletClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletClient")
            .field("available", &self.gateway.is_available())
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
