//! Receipt monitoring for submitted transactions.
//!
//! # Responsibilities
//! - Wait the initial delay, then poll for the receipt at a fixed interval
//! - Move the record to confirmed/failed exactly once
//! - Stop on shutdown or when the optional attempt bound runs out

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::TransactionConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::provider::WalletClient;
use crate::transactions::types::{TransactionRecord, TransactionStatus};

/// How a monitor finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// A receipt settled the transaction.
    Settled(TransactionStatus),
    /// The record was already terminal or is gone.
    AlreadySettled,
    /// Shutdown was triggered before a receipt arrived.
    Cancelled,
    /// The attempt bound ran out; the record stays pending.
    GaveUp { attempts: u32 },
}

/// Polls one transaction until it settles.
pub struct ReceiptMonitor {
    client: WalletClient,
    records: Arc<DashMap<String, TransactionRecord>>,
    hash: String,
    initial_delay: Duration,
    poll_interval: Duration,
    max_attempts: Option<u32>,
    shutdown: ShutdownSignal,
}

impl ReceiptMonitor {
    pub fn new(
        client: WalletClient,
        records: Arc<DashMap<String, TransactionRecord>>,
        hash: String,
        config: &TransactionConfig,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            client,
            records,
            hash,
            initial_delay: Duration::from_millis(config.receipt_initial_delay_ms),
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
            max_attempts: config.receipt_max_attempts,
            shutdown,
        }
    }

    /// Sleep for `delay`; false when shutdown fired first.
    async fn wait(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = sleep(delay) => true,
            _ = self.shutdown.recv() => false,
        }
    }

    /// Run the monitor loop.
    pub async fn run(mut self) -> MonitorOutcome {
        tracing::debug!(tx_hash = %self.hash, "Starting receipt monitor");

        if !self.wait(self.initial_delay).await {
            return MonitorOutcome::Cancelled;
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;

            match self.client.get_transaction_receipt(&self.hash).await {
                Ok(Some(receipt)) => {
                    let Some(mut record) = self.records.get_mut(&self.hash) else {
                        return MonitorOutcome::AlreadySettled;
                    };
                    return match record.apply_receipt(&receipt) {
                        Some(status) => {
                            tracing::info!(
                                tx_hash = %self.hash,
                                status = %status,
                                gas_used = ?record.gas_used,
                                "Transaction settled"
                            );
                            metrics::record_transaction_settled(status.as_str());
                            MonitorOutcome::Settled(status)
                        }
                        None => MonitorOutcome::AlreadySettled,
                    };
                }
                Ok(None) => {
                    tracing::debug!(tx_hash = %self.hash, attempts, "Transaction pending");
                }
                Err(e) => {
                    // A failed poll says nothing about the transaction itself.
                    tracing::warn!(tx_hash = %self.hash, error = %e, "Receipt poll failed, will retry");
                }
            }

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                tracing::warn!(tx_hash = %self.hash, attempts, "Giving up on receipt, transaction left pending");
                return MonitorOutcome::GaveUp { attempts };
            }
            if !self.wait(self.poll_interval).await {
                return MonitorOutcome::Cancelled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::provider::types::{ProviderError, RpcMethod};
    use crate::provider::InMemoryProvider;

    const HASH: &str = "0x00000000000000000000000000000000000000000000000000000000000000aa";

    fn setup(
        max_attempts: Option<u32>,
    ) -> (
        Arc<InMemoryProvider>,
        Arc<DashMap<String, TransactionRecord>>,
        ReceiptMonitor,
        Shutdown,
    ) {
        let provider = Arc::new(InMemoryProvider::new());
        let records = Arc::new(DashMap::new());
        records.insert(
            HASH.to_string(),
            TransactionRecord {
                hash: HASH.into(),
                from: "0xaa".into(),
                to: "0xbb".into(),
                value_eth: "1.0".into(),
                gas_used: None,
                status: TransactionStatus::Pending,
                timestamp: 0,
            },
        );
        let config = TransactionConfig {
            receipt_max_attempts: max_attempts,
            ..TransactionConfig::default()
        };
        let shutdown = Shutdown::new();
        let monitor = ReceiptMonitor::new(
            WalletClient::new(provider.clone()),
            records.clone(),
            HASH.to_string(),
            &config,
            shutdown.subscribe(),
        );
        (provider, records, monitor, shutdown)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_receipt() {
        let (provider, records, monitor, _shutdown) = setup(None);
        let handle = tokio::spawn(monitor.run());

        // First poll at 2s, then every 5s: 2s, 7s, 12s.
        sleep(Duration::from_millis(12_500)).await;
        assert_eq!(provider.call_count(RpcMethod::GetTransactionReceipt), 3);
        assert_eq!(records.get(HASH).unwrap().status, TransactionStatus::Pending);

        provider.mine(HASH, true, 21_000);
        assert_eq!(
            handle.await.unwrap(),
            MonitorOutcome::Settled(TransactionStatus::Confirmed)
        );
        let record = records.get(HASH).unwrap();
        assert_eq!(record.status, TransactionStatus::Confirmed);
        assert_eq!(record.gas_used, Some(21_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_receipt() {
        let (provider, records, monitor, _shutdown) = setup(None);
        provider.mine(HASH, false, 30_000);
        assert_eq!(
            monitor.run().await,
            MonitorOutcome::Settled(TransactionStatus::Failed)
        );
        assert_eq!(records.get(HASH).unwrap().status, TransactionStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_errors_are_retried() {
        let (provider, _records, monitor, _shutdown) = setup(None);
        provider.fail_next(
            RpcMethod::GetTransactionReceipt,
            ProviderError::Transport("connection reset".into()),
        );
        let handle = tokio::spawn(monitor.run());

        sleep(Duration::from_millis(2_500)).await;
        provider.mine(HASH, true, 21_000);
        assert_eq!(
            handle.await.unwrap(),
            MonitorOutcome::Settled(TransactionStatus::Confirmed)
        );
        assert_eq!(provider.call_count(RpcMethod::GetTransactionReceipt), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_bound() {
        let (provider, records, monitor, _shutdown) = setup(Some(3));
        assert_eq!(monitor.run().await, MonitorOutcome::GaveUp { attempts: 3 });
        assert_eq!(provider.call_count(RpcMethod::GetTransactionReceipt), 3);
        assert_eq!(records.get(HASH).unwrap().status, TransactionStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels() {
        let (provider, _records, monitor, shutdown) = setup(None);
        let handle = tokio::spawn(monitor.run());

        sleep(Duration::from_millis(8_000)).await;
        shutdown.trigger();
        assert_eq!(handle.await.unwrap(), MonitorOutcome::Cancelled);
        assert_eq!(provider.call_count(RpcMethod::GetTransactionReceipt), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_record_not_overwritten() {
        let (provider, records, monitor, _shutdown) = setup(None);
        records.get_mut(HASH).unwrap().status = TransactionStatus::Confirmed;
        provider.mine(HASH, false, 21_000);
        assert_eq!(monitor.run().await, MonitorOutcome::AlreadySettled);
        assert_eq!(records.get(HASH).unwrap().status, TransactionStatus::Confirmed);
    }
}
