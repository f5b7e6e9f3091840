//! Application shell.
//!
//! # Responsibilities
//! - Build the wallet, transaction and identity components from config
//! - Restore the persisted user at startup
//! - Log in through any identity path and log out
//!
//! # Data Flow
//! ```text
//! login / signup / connect_wallet / IdentityEvent::SignedIn
//!     → User → SessionStore.save → current user (watch)
//! logout
//!     → SessionStore.clear → wallet.disconnect → current user = None
//! ```

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::config::ShellConfig;
use crate::error::{ValidationError, WalletResult};
use crate::identity::{self, GoogleSignIn, IdentityError, IdentityEvent, User};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::provider::{ProviderGateway, WalletClient};
use crate::storage::{KeyValueStore, SessionStore};
use crate::transactions::{DraftEstimator, TransactionCoordinator};
use crate::wallet::WalletSessionManager;

const IDENTITY_CHANNEL_CAPACITY: usize = 8;

/// Everything the dashboard reads from, wired together.
pub struct AppShell {
    wallet: Arc<WalletSessionManager>,
    transactions: Arc<TransactionCoordinator>,
    draft: DraftEstimator,
    sessions: SessionStore,
    google: GoogleSignIn,
    user: watch::Sender<Option<User>>,
    identity_error: Mutex<Option<IdentityError>>,
    shutdown: Shutdown,
}

impl AppShell {
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        store: Arc<dyn KeyValueStore>,
        config: &ShellConfig,
        shutdown: Shutdown,
    ) -> Arc<Self> {
        let mut client = WalletClient::new(gateway);
        if config.provider.rpc_timeout_secs > 0 {
            client = client.with_timeout(Duration::from_secs(config.provider.rpc_timeout_secs));
        }

        let wallet = WalletSessionManager::new(client.clone(), shutdown.subscribe());
        let transactions = Arc::new(TransactionCoordinator::new(
            client,
            config.transactions.clone(),
            shutdown.clone(),
        ));
        let draft = DraftEstimator::new(transactions.clone());

        let (events_tx, events_rx) = mpsc::channel(IDENTITY_CHANNEL_CAPACITY);
        let google = GoogleSignIn::new(events_tx, config.identity.google_client_id.clone());
        let (user, _) = watch::channel(None);

        let shell = Arc::new(Self {
            wallet,
            transactions,
            draft,
            sessions: SessionStore::new(store, config.storage.session_key.clone()),
            google,
            user,
            identity_error: Mutex::new(None),
            shutdown: shutdown.clone(),
        });

        tokio::spawn(identity_events(
            Arc::downgrade(&shell),
            events_rx,
            shutdown.subscribe(),
        ));
        shell
    }

    pub fn wallet(&self) -> &Arc<WalletSessionManager> {
        &self.wallet
    }

    pub fn transactions(&self) -> &Arc<TransactionCoordinator> {
        &self.transactions
    }

    pub fn draft(&self) -> &DraftEstimator {
        &self.draft
    }

    pub fn google(&self) -> &GoogleSignIn {
        &self.google
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn subscribe_user(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    pub fn identity_error(&self) -> Option<IdentityError> {
        self.identity_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Load the persisted user and re-read the wallet.
    pub async fn restore(&self) -> Option<User> {
        let user = match self.sessions.load() {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted session");
                None
            }
        };
        if let Some(user) = &user {
            tracing::info!(name = %user.name, kind = user.account_kind().label(), "Session restored");
        }
        self.user.send_replace(user.clone());

        // Failures land on the wallet session.
        let _ = self.wallet.refresh().await;
        user
    }

    /// Make `user` the logged-in user and persist it.
    ///
    /// A failed write leaves the user logged in for this run only.
    pub fn login(&self, user: User) {
        if let Err(e) = self.sessions.save(&user) {
            tracing::warn!(error = %e, "Could not persist session");
        }
        tracing::info!(name = %user.name, kind = user.account_kind().label(), "User logged in");
        self.user.send_replace(Some(user));
    }

    pub fn login_with_password(&self, email: &str, password: &str) -> Result<User, ValidationError> {
        let user = identity::login(email, password)?;
        self.login(user.clone());
        Ok(user)
    }

    pub fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, ValidationError> {
        let user = identity::signup(name, email, password, confirm_password)?;
        self.login(user.clone());
        Ok(user)
    }

    /// Connect the wallet and log in as its first account.
    pub async fn connect_wallet(&self) -> WalletResult<User> {
        let user = User::from(self.wallet.connect().await?);
        self.login(user.clone());
        Ok(user)
    }

    pub fn logout(&self) {
        if let Err(e) = self.sessions.clear() {
            tracing::warn!(error = %e, "Could not remove persisted session");
        }
        self.wallet.disconnect();
        self.user.send_replace(None);
        tracing::info!("User logged out");
    }

    fn handle_identity_event(&self, event: IdentityEvent) {
        match event {
            IdentityEvent::SignedIn(identity) => {
                *self.identity_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
                self.login(User::from(identity));
            }
            IdentityEvent::Failed(e) => {
                tracing::warn!(error = %e, "Google sign-in failed");
                *self.identity_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(e);
            }
        }
    }

    /// Stop background work: receipt monitors, event listeners, identity loop.
    pub fn teardown(&self) {
        self.shutdown.trigger();
        self.wallet.teardown();
    }
}

impl std::fmt::Debug for AppShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppShell")
            .field("user", &*self.user.borrow())
            .field("wallet", &self.wallet)
            .field("transactions", &self.transactions)
            .finish()
    }
}

async fn identity_events(
    shell: Weak<AppShell>,
    mut events: mpsc::Receiver<IdentityEvent>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.recv() => return,
            event = events.recv() => event,
        };
        let (Some(event), Some(strong)) = (event, shell.upgrade()) else {
            return;
        };
        strong.handle_identity_event(event);
    }
}
