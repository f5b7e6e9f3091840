//! Transaction coordinator: validate, price, submit and track transfers.
//!
//! # Responsibilities
//! - Reject malformed requests before touching the provider
//! - Estimate gas limit and price for a draft
//! - Submit one transaction at a time and start its receipt monitor
//! - Own the transaction list and the last recorded error

use alloy::primitives::hex;
use alloy::primitives::U256;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

use crate::config::TransactionConfig;
use crate::error::{Action, WalletError, WalletResult};
use crate::lifecycle::{BusyGuard, Shutdown};
use crate::observability::metrics;
use crate::provider::types::{to_quantity, TxPayload};
use crate::provider::WalletClient;
use crate::transactions::monitor::{MonitorOutcome, ReceiptMonitor};
use crate::transactions::types::{GasEstimate, TransactionRecord, TransactionRequest, TransactionStatus};
use crate::transactions::units::format_ether_exact;
use crate::transactions::validation::validate_transfer;

#[derive(Debug, Default)]
struct ErrorSlot {
    /// Bumped on every write so a stale auto-clear leaves newer errors alone.
    generation: u64,
    error: Option<WalletError>,
}

/// Validates, prices, submits and tracks native-currency transfers.
pub struct TransactionCoordinator {
    client: WalletClient,
    records: Arc<DashMap<String, TransactionRecord>>,
    error: Arc<Mutex<ErrorSlot>>,
    submitting: AtomicBool,
    config: TransactionConfig,
    shutdown: Shutdown,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn lower_hex(address: &alloy::primitives::Address) -> String {
    address.to_string().to_lowercase()
}

fn lock_slot(slot: &Mutex<ErrorSlot>) -> MutexGuard<'_, ErrorSlot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

impl TransactionCoordinator {
    pub fn new(client: WalletClient, config: TransactionConfig, shutdown: Shutdown) -> Self {
        Self {
            client,
            records: Arc::new(DashMap::new()),
            error: Arc::new(Mutex::new(ErrorSlot::default())),
            submitting: AtomicBool::new(false),
            config,
            shutdown,
        }
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Quote the fee for `request`.
    ///
    /// Failures are recorded as the last error as well as returned.
    pub async fn estimate_gas(&self, request: &TransactionRequest) -> WalletResult<GasEstimate> {
        let result = self.try_estimate_gas(request).await;
        if let Err(e) = &result {
            self.record_error(e.clone());
        }
        result
    }

    async fn try_estimate_gas(&self, request: &TransactionRequest) -> WalletResult<GasEstimate> {
        if !self.client.is_available() {
            return Err(WalletError::ProviderUnavailable);
        }
        let (to, wei) = validate_transfer(&request.to, &request.value_eth)?;
        self.clear_error();

        let payload = TxPayload {
            to: lower_hex(&to),
            value: to_quantity(wei),
            data: Some(
                request
                    .data
                    .as_ref()
                    .map_or_else(|| "0x".to_string(), hex::encode_prefixed),
            ),
            ..TxPayload::default()
        };

        let gas_limit = self
            .client
            .estimate_gas(&payload)
            .await
            .map_err(|e| WalletError::from_provider(e, Action::EstimateGas))?;
        let gas_price = self
            .client
            .gas_price()
            .await
            .map_err(|e| WalletError::from_provider(e, Action::EstimateGas))?;

        let fee = gas_limit
            .checked_mul(gas_price)
            .ok_or_else(|| WalletError::Rpc {
                code: None,
                message: "Estimated fee does not fit in 256 bits".to_string(),
            })?;

        tracing::debug!(%gas_limit, %gas_price, %fee, "Gas estimated");

        Ok(GasEstimate {
            gas_limit,
            gas_price,
            estimated_fee_eth: format_ether_exact(fee),
        })
    }

    /// Submit `request` through the wallet and start monitoring it.
    ///
    /// Validation happens before any provider call. Only one submission may be
    /// in flight; a concurrent call fails with `RequestAlreadyPending`.
    pub async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> WalletResult<TransactionRecord> {
        let result = self.try_send_transaction(request).await;
        if let Err(e) = &result {
            self.record_error(e.clone());
        }
        result
    }

    async fn try_send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> WalletResult<TransactionRecord> {
        if !self.client.is_available() {
            return Err(WalletError::ProviderUnavailable);
        }
        let (to, wei) = validate_transfer(&request.to, &request.value_eth)?;

        let _busy = BusyGuard::try_claim(&self.submitting)
            .ok_or(WalletError::RequestAlreadyPending(Action::Transaction))?;
        self.clear_error();

        let from = self
            .client
            .accounts()
            .await
            .map_err(|e| WalletError::from_provider(e, Action::Transaction))?
            .first()
            .copied()
            .ok_or(WalletError::NoAccounts)?;

        let payload = TxPayload {
            from: Some(lower_hex(&from)),
            to: lower_hex(&to),
            value: to_quantity(wei),
            gas: request.gas_limit.map(to_quantity),
            gas_price: request.gas_price.map(to_quantity),
            data: request.data.as_ref().map(hex::encode_prefixed),
        };

        let hash = self
            .client
            .send_transaction(&payload)
            .await
            .map_err(|e| WalletError::from_provider(e, Action::Transaction))?;

        let record = TransactionRecord {
            hash: hash.clone(),
            from: lower_hex(&from),
            to: request.to.clone(),
            value_eth: request.value_eth.trim().to_string(),
            gas_used: None,
            status: TransactionStatus::Pending,
            timestamp: now_millis(),
        };

        match self.records.entry(hash.clone()) {
            Entry::Occupied(existing) => {
                tracing::warn!(tx_hash = %hash, "Provider returned a hash we already track");
                return Ok(existing.get().clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }

        tracing::info!(
            tx_hash = %hash,
            from = %record.from,
            to = %record.to,
            value_eth = %record.value_eth,
            "Transaction submitted"
        );
        metrics::record_transaction_submitted();

        self.spawn_monitor(hash);
        Ok(record)
    }

    fn spawn_monitor(&self, hash: String) -> JoinHandle<MonitorOutcome> {
        let monitor = ReceiptMonitor::new(
            self.client.clone(),
            self.records.clone(),
            hash,
            &self.config,
            self.shutdown.subscribe(),
        );
        tokio::spawn(monitor.run())
    }

    /// All tracked transactions, most recent first.
    pub fn history(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    pub fn transaction(&self, hash: &str) -> Option<TransactionRecord> {
        self.records.get(hash).map(|r| r.value().clone())
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(std::sync::atomic::Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<WalletError> {
        lock_slot(&self.error).error.clone()
    }

    pub fn clear_error(&self) {
        let mut slot = lock_slot(&self.error);
        slot.generation += 1;
        slot.error = None;
    }

    /// Record `error` and schedule its automatic removal.
    fn record_error(&self, error: WalletError) {
        tracing::warn!(error = %error, "Transaction operation failed");

        let generation = {
            let mut slot = lock_slot(&self.error);
            slot.generation += 1;
            slot.error = Some(error);
            slot.generation
        };

        if self.config.error_clear_ms == 0 {
            return;
        }
        let slot = self.error.clone();
        let delay = Duration::from_millis(self.config.error_clear_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = lock_slot(&slot);
            if slot.generation == generation {
                slot.error = None;
            }
        });
    }

    /// Trigger shutdown, cancelling every receipt monitor.
    pub fn teardown(&self) {
        self.shutdown.trigger();
    }

    /// Total fee for a pinned estimate, in wei.
    pub fn fee_wei(estimate: &GasEstimate) -> U256 {
        estimate.gas_limit.saturating_mul(estimate.gas_price)
    }
}

impl std::fmt::Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .field("tracked", &self.records.len())
            .field("submitting", &self.is_submitting())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::provider::types::{ProviderError, RpcMethod};
    use crate::provider::InMemoryProvider;
    use alloy::primitives::{Address, Bytes};

    const RECIPIENT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn alice() -> Address {
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
    }

    fn setup() -> (Arc<InMemoryProvider>, TransactionCoordinator) {
        let provider = Arc::new(
            InMemoryProvider::new()
                .with_accounts(vec![alice()])
                .with_gas(U256::from(21_000u64), U256::from(20_000_000_000u64))
                .authorized(),
        );
        let coordinator = TransactionCoordinator::new(
            WalletClient::new(provider.clone()),
            TransactionConfig::default(),
            Shutdown::new(),
        );
        (provider, coordinator)
    }

    #[tokio::test]
    async fn test_estimate_fee_is_exact_product() {
        let (provider, coordinator) = setup();
        provider.set_gas(U256::from(21_001u64), U256::from(1_000_000_007u64));

        let estimate = coordinator
            .estimate_gas(&TransactionRequest::new(RECIPIENT, "0.0001"))
            .await
            .unwrap();
        assert_eq!(estimate.gas_limit, U256::from(21_001u64));
        assert_eq!(estimate.gas_price, U256::from(1_000_000_007u64));
        // 21001 * 1000000007 = 21001000147007 wei
        assert_eq!(estimate.estimated_fee_eth, "0.000021001000147007");
        assert_eq!(
            TransactionCoordinator::fee_wei(&estimate),
            U256::from(21_001_000_147_007u64)
        );

        let params = provider.calls(RpcMethod::EstimateGas);
        assert_eq!(params[0][0]["value"], "0x5af3107a4000");
        assert_eq!(params[0][0]["data"], "0x");
    }

    #[tokio::test]
    async fn test_estimate_failure_is_recorded() {
        let (provider, coordinator) = setup();
        provider.fail_next(RpcMethod::EstimateGas, ProviderError::rpc(-32000, "insufficient funds"));

        let err = coordinator
            .estimate_gas(&TransactionRequest::new(RECIPIENT, "1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "insufficient funds");
        assert_eq!(coordinator.last_error(), Some(err));
    }

    #[tokio::test]
    async fn test_invalid_recipient_makes_no_provider_call() {
        let (provider, coordinator) = setup();
        let err = coordinator
            .send_transaction(&TransactionRequest::new("0xInvalid", "1.0"))
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::Validation(ValidationError::InvalidAddress));
        assert_eq!(provider.total_calls(), 0);
        assert!(coordinator.last_error().unwrap().is_validation());
    }

    #[tokio::test]
    async fn test_send_builds_hex_payload() {
        let (provider, coordinator) = setup();
        let request = TransactionRequest::new(RECIPIENT, "1.5")
            .with_data(Bytes::from(vec![0xde, 0xad]));
        let request = TransactionRequest {
            gas_limit: Some(U256::from(21_000u64)),
            gas_price: Some(U256::from(1_000_000_000u64)),
            ..request
        };

        let record = coordinator.send_transaction(&request).await.unwrap();
        assert_eq!(record.status, TransactionStatus::Pending);
        assert_eq!(record.from, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(record.to, RECIPIENT);

        let sent = provider.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].value, "0x14d1120d7b160000");
        assert_eq!(sent[0].gas.as_deref(), Some("0x5208"));
        assert_eq!(sent[0].gas_price.as_deref(), Some("0x3b9aca00"));
        assert_eq!(sent[0].data.as_deref(), Some("0xdead"));
        assert_eq!(sent[0].to, RECIPIENT.to_lowercase());
    }

    #[tokio::test]
    async fn test_user_rejection() {
        let (provider, coordinator) = setup();
        provider.fail_next(RpcMethod::SendTransaction, ProviderError::user_rejected());

        let err = coordinator
            .send_transaction(&TransactionRequest::new(RECIPIENT, "1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Transaction rejected by user");
        assert!(coordinator.history().is_empty());
        assert!(!coordinator.is_submitting());
    }

    #[tokio::test]
    async fn test_concurrent_submit_rejected() {
        let (provider, coordinator) = setup();
        provider.hold(RpcMethod::SendTransaction);
        let request = TransactionRequest::new(RECIPIENT, "1");

        let first = coordinator.send_transaction(&request);
        let second = async {
            tokio::task::yield_now().await;
            let result = coordinator.send_transaction(&request).await;
            provider.release(RpcMethod::SendTransaction);
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert_eq!(
            second.unwrap_err(),
            WalletError::RequestAlreadyPending(Action::Transaction)
        );
        assert_eq!(provider.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_no_connected_account() {
        let provider = Arc::new(InMemoryProvider::new());
        let coordinator = TransactionCoordinator::new(
            WalletClient::new(provider),
            TransactionConfig::default(),
            Shutdown::new(),
        );
        let err = coordinator
            .send_transaction(&TransactionRequest::new(RECIPIENT, "1"))
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::NoAccounts);
    }

    #[tokio::test]
    async fn test_provider_missing() {
        let coordinator = TransactionCoordinator::new(
            WalletClient::new(Arc::new(InMemoryProvider::unavailable())),
            TransactionConfig::default(),
            Shutdown::new(),
        );
        let err = coordinator
            .estimate_gas(&TransactionRequest::new(RECIPIENT, "1"))
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::ProviderUnavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_auto_clears() {
        let (_provider, coordinator) = setup();
        let _ = coordinator
            .send_transaction(&TransactionRequest::new("nope", "1"))
            .await;
        assert!(coordinator.last_error().is_some());

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert!(coordinator.last_error().is_some());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(coordinator.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_error_survives_older_clear() {
        let (_provider, coordinator) = setup();
        let _ = coordinator
            .send_transaction(&TransactionRequest::new("nope", "1"))
            .await;
        tokio::time::sleep(Duration::from_millis(3_000)).await;
        let _ = coordinator
            .send_transaction(&TransactionRequest::new(RECIPIENT, "0"))
            .await;

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(
            coordinator.last_error(),
            Some(WalletError::Validation(ValidationError::NonPositiveAmount))
        );
    }
}
