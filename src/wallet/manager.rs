//! Wallet session manager.
//!
//! # Responsibilities
//! - Connect, disconnect and refresh against the wallet provider
//! - Publish every session change through a `watch` channel
//! - Follow provider `accountsChanged` / `chainChanged` events
//!
//! # Data Flow
//! ```text
//! connect()  → eth_requestAccounts → eth_getBalance → eth_chainId → Connected
//! refresh()  → eth_accounts → [] ? Disconnected : eth_getBalance + eth_chainId
//! events     → AccountsChanged([]) → disconnect()
//!            → AccountsChanged(_) / ChainChanged(_) → refresh()
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Action, WalletError, WalletResult};
use crate::lifecycle::{BusyGuard, ShutdownSignal};
use crate::observability::metrics;
use crate::provider::types::{ProviderError, ProviderEvent};
use crate::provider::WalletClient;
use crate::wallet::session::{WalletSession, Web3User};

/// Owns the wallet session and keeps it in sync with the provider.
pub struct WalletSessionManager {
    client: WalletClient,
    state: watch::Sender<WalletSession>,
    connecting: AtomicBool,
    /// Bumped by connect and disconnect; refreshes started under an older
    /// epoch leave the session alone.
    epoch: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl WalletSessionManager {
    /// Create a manager and start following provider events until
    /// `shutdown` fires or the manager is dropped.
    pub fn new(client: WalletClient, shutdown: ShutdownSignal) -> Arc<Self> {
        let (state, _) = watch::channel(WalletSession::default());
        let events = client.subscribe();
        let manager = Arc::new(Self {
            client,
            state,
            connecting: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            listener: Mutex::new(None),
        });

        let handle = tokio::spawn(listen(Arc::downgrade(&manager), events, shutdown));
        *manager.listener.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        manager
    }

    pub fn session(&self) -> WalletSession {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.state.subscribe()
    }

    pub fn client(&self) -> &WalletClient {
        &self.client
    }

    /// Ask the wallet for access and load the first account.
    pub async fn connect(&self) -> WalletResult<Web3User> {
        if !self.client.is_available() {
            return Err(self.fail(WalletError::ProviderUnavailable));
        }
        let Some(_busy) = BusyGuard::try_claim(&self.connecting) else {
            // The first prompt is still open; leave its loading flag alone.
            let error = WalletError::RequestAlreadyPending(Action::Connect);
            tracing::warn!(error = %error, "Wallet operation failed");
            self.state.send_modify(|s| s.error = Some(error.clone()));
            return Err(error);
        };

        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.try_connect().await {
            Ok(user) => {
                tracing::info!(address = %user.address, chain_id = %user.chain_id, "Wallet connected");
                metrics::record_wallet_connected(true);
                Ok(user)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn try_connect(&self) -> WalletResult<Web3User> {
        let map = |e: ProviderError| WalletError::from_provider(e, Action::Connect);

        let accounts = self.client.request_accounts().await.map_err(map)?;
        let address = accounts.first().copied().ok_or(WalletError::NoAccounts)?;
        let balance = self.client.get_balance(address).await.map_err(map)?;
        let chain_id = self.client.chain_id().await.map_err(map)?;

        self.state.send_replace(WalletSession {
            connected: true,
            address: Some(address),
            balance_wei: Some(balance),
            chain_id: Some(chain_id.clone()),
            loading: false,
            error: None,
        });
        Ok(Web3User::new(address, balance, chain_id))
    }

    /// Forget the connection locally. The wallet keeps its authorization.
    pub fn disconnect(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let was_connected = self.state.send_replace(WalletSession::default()).connected;
        if was_connected {
            tracing::info!("Wallet disconnected");
            metrics::record_wallet_connected(false);
        }
    }

    /// Re-read accounts, balance and chain without prompting.
    ///
    /// No exposed accounts means the session is disconnected. Without a
    /// provider there is nothing to refresh.
    pub async fn refresh(&self) -> WalletResult<()> {
        if !self.client.is_available() {
            tracing::debug!("No wallet provider, skipping refresh");
            return Ok(());
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        match self.try_refresh(epoch).await {
            Ok(()) => Ok(()),
            Err(e) if self.is_current(epoch) => Err(self.fail(e)),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding stale refresh failure");
                Err(e)
            }
        }
    }

    async fn try_refresh(&self, epoch: u64) -> WalletResult<()> {
        let map = |e: ProviderError| WalletError::from_provider(e, Action::Refresh);

        let accounts = self.client.accounts().await.map_err(map)?;
        let Some(address) = accounts.first().copied() else {
            if self.is_current(epoch) {
                self.disconnect();
            }
            return Ok(());
        };
        let balance = self.client.get_balance(address).await.map_err(map)?;
        let chain_id = self.client.chain_id().await.map_err(map)?;

        // Checked under the channel lock so a concurrent disconnect wins.
        let applied = self.state.send_if_modified(|s| {
            if !self.is_current(epoch) {
                return false;
            }
            s.connected = true;
            s.address = Some(address);
            s.balance_wei = Some(balance);
            s.chain_id = Some(chain_id.clone());
            s.error = None;
            true
        });
        if applied {
            tracing::debug!(address = %address, chain_id = %chain_id, "Wallet refreshed");
        } else {
            tracing::debug!(epoch, "Discarding stale wallet refresh");
        }
        Ok(())
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Record `error` on the session and hand it back.
    fn fail(&self, error: WalletError) -> WalletError {
        tracing::warn!(error = %error, "Wallet operation failed");
        self.state.send_modify(|s| {
            s.loading = false;
            s.error = Some(error.clone());
        });
        error
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    async fn handle_event(&self, event: ProviderEvent) {
        tracing::debug!(event = ?event, "Provider event");
        match event {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => self.disconnect(),
            ProviderEvent::AccountsChanged(_) | ProviderEvent::ChainChanged(_) => {
                // Failures are already on the session.
                let _ = self.refresh().await;
            }
        }
    }

    /// Stop following provider events.
    pub fn teardown(&self) {
        if let Some(handle) = self.listener.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

impl Drop for WalletSessionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for WalletSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSessionManager")
            .field("session", &*self.state.borrow())
            .finish()
    }
}

async fn listen(
    manager: Weak<WalletSessionManager>,
    mut events: broadcast::Receiver<ProviderEvent>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.recv() => return,
            event = events.recv() => event,
        };
        let Some(manager) = manager.upgrade() else {
            return;
        };
        match event {
            Ok(event) => manager.handle_event(event).await,
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Missed provider events, refreshing");
                let _ = manager.refresh().await;
            }
            Err(RecvError::Closed) => return,
        }
    }
}
