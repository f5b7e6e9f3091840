//! In-memory injected-wallet provider.
//!
//! Behaves like a browser extension wallet: accounts stay hidden until
//! `eth_requestAccounts` authorizes the caller, submitted transactions get
//! sequential hashes, and receipts appear once [`InMemoryProvider::mine`] is
//! called. Failures, latency and held prompts can be scripted per method,
//! which is what the offline harness mode and the test-suite rely on.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

use crate::provider::types::{
    to_quantity, ProviderError, ProviderEvent, RpcMethod, TxPayload, UNAUTHORIZED_CODE,
};
use crate::provider::ProviderGateway;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug)]
struct WalletState {
    accounts: Vec<Address>,
    authorized: bool,
    balances: HashMap<Address, U256>,
    chain_id: String,
    gas_limit: U256,
    gas_price: U256,
    receipts: HashMap<String, Value>,
    sent: Vec<TxPayload>,
    next_tx: u64,
    failures: HashMap<RpcMethod, VecDeque<ProviderError>>,
    delays: HashMap<RpcMethod, VecDeque<Duration>>,
    calls: Vec<(RpcMethod, Value)>,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            authorized: false,
            balances: HashMap::new(),
            chain_id: "0x1".to_string(),
            gas_limit: U256::from(21_000u64),
            gas_price: U256::from(20_000_000_000u64),
            receipts: HashMap::new(),
            sent: Vec::new(),
            next_tx: 1,
            failures: HashMap::new(),
            delays: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

/// Scriptable wallet living entirely in process memory.
#[derive(Debug)]
pub struct InMemoryProvider {
    state: Mutex<WalletState>,
    holds: Mutex<HashMap<RpcMethod, Arc<Notify>>>,
    events: broadcast::Sender<ProviderEvent>,
    available: AtomicBool,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(WalletState::default()),
            holds: Mutex::new(HashMap::new()),
            events,
            available: AtomicBool::new(true),
        }
    }

    /// A provider that reports itself as not installed.
    pub fn unavailable() -> Self {
        let provider = Self::new();
        provider.available.store(false, Ordering::SeqCst);
        provider
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.lock().accounts = accounts;
        self
    }

    pub fn with_balance(self, address: Address, wei: U256) -> Self {
        self.lock().balances.insert(address, wei);
        self
    }

    pub fn with_chain_id(self, chain_id: &str) -> Self {
        self.lock().chain_id = chain_id.to_string();
        self
    }

    pub fn with_gas(self, gas_limit: U256, gas_price: U256) -> Self {
        self.set_gas(gas_limit, gas_price);
        self
    }

    /// Pre-authorize the caller, as if access had been granted earlier.
    pub fn authorized(self) -> Self {
        self.lock().authorized = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, WalletState> {
        // A panic while holding the lock cannot leave the maps half-written,
        // so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_gas(&self, gas_limit: U256, gas_price: U256) {
        let mut state = self.lock();
        state.gas_limit = gas_limit;
        state.gas_price = gas_price;
    }

    pub fn set_balance(&self, address: Address, wei: U256) {
        self.lock().balances.insert(address, wei);
    }

    /// Replace the exposed accounts and notify subscribers.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let visible = {
            let mut state = self.lock();
            state.accounts = accounts;
            if state.authorized {
                state.accounts.clone()
            } else {
                Vec::new()
            }
        };
        let _ = self.events.send(ProviderEvent::AccountsChanged(visible));
    }

    /// Revoke access, as when the user locks the wallet.
    pub fn lock_wallet(&self) {
        self.lock().authorized = false;
        let _ = self.events.send(ProviderEvent::AccountsChanged(Vec::new()));
    }

    /// Switch networks and notify subscribers.
    pub fn switch_chain(&self, chain_id: &str) {
        self.lock().chain_id = chain_id.to_string();
        let _ = self
            .events
            .send(ProviderEvent::ChainChanged(chain_id.to_string()));
    }

    /// Make the next call of `method` fail with `error`.
    pub fn fail_next(&self, method: RpcMethod, error: ProviderError) {
        self.lock()
            .failures
            .entry(method)
            .or_default()
            .push_back(error);
    }

    /// Make the next call of `method` take `delay` before answering.
    pub fn delay_next(&self, method: RpcMethod, delay: Duration) {
        self.lock().delays.entry(method).or_default().push_back(delay);
    }

    /// Keep calls of `method` waiting until [`release`](Self::release).
    pub fn hold(&self, method: RpcMethod) {
        self.holds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(method, Arc::new(Notify::new()));
    }

    /// Let a held call of `method` proceed.
    pub fn release(&self, method: RpcMethod) {
        let gate = self
            .holds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&method);
        if let Some(gate) = gate {
            gate.notify_one();
        }
    }

    /// Produce a receipt for a submitted transaction.
    pub fn mine(&self, hash: &str, success: bool, gas_used: u64) {
        let receipt = json!({
            "transactionHash": hash,
            "status": if success { "0x1" } else { "0x0" },
            "gasUsed": format!("0x{gas_used:x}"),
        });
        self.lock().receipts.insert(hash.to_string(), receipt);
    }

    /// Transactions accepted by `eth_sendTransaction`, oldest first.
    pub fn sent_transactions(&self) -> Vec<TxPayload> {
        self.lock().sent.clone()
    }

    pub fn call_count(&self, method: RpcMethod) -> usize {
        self.lock().calls.iter().filter(|(m, _)| *m == method).count()
    }

    /// Parameters of every call of `method`, oldest first.
    pub fn calls(&self, method: RpcMethod) -> Vec<Value> {
        self.lock()
            .calls
            .iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.len()
    }

    /// Compute the answer from the state at call time.
    fn answer(&self, method: RpcMethod, params: &Value) -> Result<Value, ProviderError> {
        let mut state = self.lock();
        match method {
            RpcMethod::RequestAccounts => {
                state.authorized = true;
                Ok(json!(lower_hex_all(&state.accounts)))
            }
            RpcMethod::Accounts => {
                if state.authorized {
                    Ok(json!(lower_hex_all(&state.accounts)))
                } else {
                    Ok(json!([]))
                }
            }
            RpcMethod::GetBalance => {
                let address: Address = params
                    .get(0)
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| ProviderError::rpc(-32602, "invalid address parameter"))?;
                let balance = state.balances.get(&address).copied().unwrap_or_default();
                Ok(json!(to_quantity(balance)))
            }
            RpcMethod::ChainId => Ok(json!(state.chain_id)),
            RpcMethod::EstimateGas => Ok(json!(to_quantity(state.gas_limit))),
            RpcMethod::GasPrice => Ok(json!(to_quantity(state.gas_price))),
            RpcMethod::SendTransaction => {
                if !state.authorized {
                    return Err(ProviderError::rpc(
                        UNAUTHORIZED_CODE,
                        "The requested account has not been authorized by the user.",
                    ));
                }
                let payload: TxPayload = params
                    .get(0)
                    .cloned()
                    .and_then(|p| serde_json::from_value(p).ok())
                    .ok_or_else(|| ProviderError::rpc(-32602, "invalid transaction parameter"))?;
                let hash = format!("0x{:064x}", state.next_tx);
                state.next_tx += 1;
                state.sent.push(payload);
                Ok(json!(hash))
            }
            RpcMethod::GetTransactionReceipt => {
                let hash = params.get(0).and_then(Value::as_str).unwrap_or_default();
                Ok(state.receipts.get(hash).cloned().unwrap_or(Value::Null))
            }
        }
    }
}

fn lower_hex_all(accounts: &[Address]) -> Vec<String> {
    accounts
        .iter()
        .map(|a| a.to_string().to_lowercase())
        .collect()
}

#[async_trait]
impl ProviderGateway for InMemoryProvider {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn request(&self, method: RpcMethod, params: Value) -> Result<Value, ProviderError> {
        let (failure, delay) = {
            let mut state = self.lock();
            state.calls.push((method, params.clone()));
            (
                state.failures.get_mut(&method).and_then(VecDeque::pop_front),
                state.delays.get_mut(&method).and_then(VecDeque::pop_front),
            )
        };
        let gate = self
            .holds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&method)
            .cloned();

        let answer = match failure {
            Some(error) => Err(error),
            None => self.answer(method, &params),
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        answer
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
