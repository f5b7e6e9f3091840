//! Debounced fee estimation for a transfer being edited.
//!
//! # Data Flow
//! ```text
//! update(to, value)
//!     → generation += 1
//!     → inputs valid? sleep(debounce) → estimate_gas
//!     → result kept only if the generation is unchanged
//! submit()
//!     → pending estimate dropped, pinned estimate (if Ready)
//!     → coordinator.send_transaction
//!     → draft reset on success; on failure the form is restored, or
//!       re-estimated when no estimate was ready
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::WalletResult;
use crate::transactions::coordinator::TransactionCoordinator;
use crate::transactions::types::{GasEstimate, TransactionRecord, TransactionRequest};
use crate::transactions::validation::validate_transfer;

/// Where the draft stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DraftPhase {
    /// Being edited, or the inputs are not yet valid.
    #[default]
    Editing,
    /// An estimate is pending for the current inputs.
    Estimating,
    /// The fee for the current inputs is known.
    Ready(GasEstimate),
    /// Estimation failed for the current inputs.
    EstimateFailed(String),
    Submitting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftState {
    pub to: String,
    pub value_eth: String,
    pub phase: DraftPhase,
}

#[derive(Debug, Default)]
struct Pending {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

/// Holds the transfer form and keeps its fee estimate current.
pub struct DraftEstimator {
    coordinator: Arc<TransactionCoordinator>,
    state: Arc<watch::Sender<DraftState>>,
    pending: Arc<Mutex<Pending>>,
    debounce: Duration,
}

impl DraftEstimator {
    pub fn new(coordinator: Arc<TransactionCoordinator>) -> Self {
        let debounce = Duration::from_millis(coordinator.config().estimate_debounce_ms);
        let (state, _) = watch::channel(DraftState::default());
        Self {
            coordinator,
            state: Arc::new(state),
            pending: Arc::new(Mutex::new(Pending::default())),
            debounce,
        }
    }

    pub fn state(&self) -> DraftState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DraftState> {
        self.state.subscribe()
    }

    /// Replace the form inputs and schedule a fresh estimate.
    pub fn update(&self, to: impl Into<String>, value_eth: impl Into<String>) {
        let to = to.into();
        let value_eth = value_eth.into();
        let valid = validate_transfer(&to, &value_eth).is_ok();

        // Older tasks are left to run out; the generation check drops them.
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.generation += 1;

        self.state.send_replace(DraftState {
            to: to.clone(),
            value_eth: value_eth.clone(),
            phase: if valid {
                DraftPhase::Estimating
            } else {
                DraftPhase::Editing
            },
        });

        if !valid {
            return;
        }

        let generation = pending.generation;
        let coordinator = self.coordinator.clone();
        let state = self.state.clone();
        let tracker = self.pending.clone();
        let debounce = self.debounce;

        pending.task = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if !is_current(&tracker, generation) {
                return;
            }

            let request = TransactionRequest::new(to, value_eth);
            let result = coordinator.estimate_gas(&request).await;

            // Inputs changed while the provider was answering.
            if !is_current(&tracker, generation) {
                tracing::debug!(generation, "Discarding stale gas estimate");
                return;
            }
            let phase = match result {
                Ok(estimate) => DraftPhase::Ready(estimate),
                Err(e) => DraftPhase::EstimateFailed(e.to_string()),
            };
            state.send_modify(|draft| draft.phase = phase);
        }));
    }

    /// Submit the current draft, pinning the estimate when one is ready.
    pub async fn submit(&self) -> WalletResult<TransactionRecord> {
        let draft = self.state();
        let mut request = TransactionRequest::new(draft.to.clone(), draft.value_eth.clone());
        if let DraftPhase::Ready(estimate) = &draft.phase {
            request = request.with_estimate(estimate);
        }

        let generation = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.generation += 1;
            if let Some(task) = pending.task.take() {
                task.abort();
            }
            self.state
                .send_modify(|state| state.phase = DraftPhase::Submitting);
            pending.generation
        };

        match self.coordinator.send_transaction(&request).await {
            Ok(record) => {
                self.reset();
                Ok(record)
            }
            Err(e) => {
                // Edits made while submitting own the state now.
                if is_current(&self.pending, generation) {
                    match draft.phase {
                        phase @ DraftPhase::Ready(_) => {
                            self.state.send_modify(|state| state.phase = phase);
                        }
                        _ => self.update(draft.to, draft.value_eth),
                    }
                }
                Err(e)
            }
        }
    }

    /// Clear the form and drop any pending estimate.
    pub fn reset(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.generation += 1;
        if let Some(task) = pending.task.take() {
            task.abort();
        }
        self.state.send_replace(DraftState::default());
    }
}

fn is_current(pending: &Mutex<Pending>, generation: u64) -> bool {
    pending.lock().unwrap_or_else(|e| e.into_inner()).generation == generation
}

impl Drop for DraftEstimator {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = pending.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransactionConfig;
    use crate::lifecycle::Shutdown;
    use crate::provider::types::{ProviderError, RpcMethod};
    use crate::provider::{InMemoryProvider, WalletClient};
    use alloy::primitives::{Address, U256};

    const RECIPIENT: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    fn setup() -> (Arc<InMemoryProvider>, DraftEstimator) {
        let account: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
        let provider = Arc::new(
            InMemoryProvider::new()
                .with_accounts(vec![account])
                .authorized(),
        );
        let coordinator = Arc::new(TransactionCoordinator::new(
            WalletClient::new(provider.clone()),
            TransactionConfig::default(),
            Shutdown::new(),
        ));
        (provider, DraftEstimator::new(coordinator))
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_estimate_once() {
        let (provider, draft) = setup();
        for value in ["0", "0.", "0.1", "0.12", "0.125"] {
            draft.update(RECIPIENT, value);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        let calls = provider.calls(RpcMethod::EstimateGas);
        assert_eq!(calls.len(), 1);
        // 0.125 ether
        assert_eq!(calls[0][0]["value"], "0x1bc16d674ec8000");
        assert!(matches!(draft.state().phase, DraftPhase::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_estimate_discarded() {
        let (provider, draft) = setup();
        provider.delay_next(RpcMethod::EstimateGas, Duration::from_secs(3));

        draft.update(RECIPIENT, "1");
        // Debounce elapses, the first estimate is now in flight.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(provider.call_count(RpcMethod::EstimateGas), 1);

        provider.set_gas(U256::from(30_000u64), U256::from(1_000_000_000u64));
        draft.update(RECIPIENT, "2");
        tokio::time::sleep(Duration::from_secs(5)).await;

        match draft.state().phase {
            DraftPhase::Ready(estimate) => assert_eq!(estimate.gas_limit, U256::from(30_000u64)),
            other => panic!("unexpected phase {other:?}"),
        }
        assert_eq!(draft.state().value_eth, "2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_inputs_skip_estimation() {
        let (provider, draft) = setup();
        draft.update("0xInvalid", "1");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(provider.total_calls(), 0);
        assert_eq!(draft.state().phase, DraftPhase::Editing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_pins_estimate_and_resets() {
        let (provider, draft) = setup();
        draft.update(RECIPIENT, "0.5");
        tokio::time::sleep(Duration::from_secs(1)).await;

        let record = draft.submit().await.unwrap();
        assert_eq!(record.value_eth, "0.5");
        assert_eq!(draft.state(), DraftState::default());

        let sent = provider.sent_transactions();
        assert_eq!(sent[0].gas.as_deref(), Some("0x5208"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_submit_during_estimate_reestimates() {
        let (provider, draft) = setup();
        provider.delay_next(RpcMethod::EstimateGas, Duration::from_secs(3));
        draft.update(RECIPIENT, "1");
        tokio::time::sleep(Duration::from_millis(600)).await;

        provider.fail_next(RpcMethod::SendTransaction, ProviderError::user_rejected());
        provider.delay_next(RpcMethod::SendTransaction, Duration::from_secs(5));
        assert!(draft.submit().await.is_err());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(matches!(draft.state().phase, DraftPhase::Ready(_)));
        assert_eq!(draft.state().value_eth, "1");
        assert_eq!(provider.call_count(RpcMethod::EstimateGas), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_submit_keeps_ready_estimate() {
        let (provider, draft) = setup();
        draft.update(RECIPIENT, "0.5");
        tokio::time::sleep(Duration::from_secs(1)).await;

        provider.fail_next(RpcMethod::SendTransaction, ProviderError::user_rejected());
        assert!(draft.submit().await.is_err());

        assert!(matches!(draft.state().phase, DraftPhase::Ready(_)));
        assert_eq!(provider.call_count(RpcMethod::EstimateGas), 1);
    }
}
