//! JSON-RPC node gateway with failover.
//!
//! # Responsibilities
//! - Forward wallet requests to a node over HTTP (primary + failovers)
//! - Serve `eth_requestAccounts` from `eth_accounts` (nodes never prompt)
//! - Turn node state changes into `accountsChanged` / `chainChanged` events
//!   by polling, since plain HTTP has no push channel

use alloy::providers::{Provider, RootProvider};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::config::ProviderConfig;
use crate::lifecycle::ShutdownSignal;
use crate::provider::types::{parse_accounts, parse_string, ProviderError, ProviderEvent, RpcMethod};
use crate::provider::ProviderGateway;

const EVENT_CAPACITY: usize = 16;

/// Gateway backed by one or more JSON-RPC endpoints.
#[derive(Clone)]
pub struct RpcGateway {
    /// Primary first, then failovers in configured order.
    providers: Vec<RootProvider>,
    events: broadcast::Sender<ProviderEvent>,
    config: ProviderConfig,
}

impl RpcGateway {
    /// Create a gateway from configuration.
    ///
    /// Fails only when the primary URL does not parse; invalid failover URLs
    /// are skipped with a warning.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let primary: url::Url = config.rpc_url.parse().map_err(|e| {
            ProviderError::Transport(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let mut providers = vec![RootProvider::new_http(primary)];

        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(RootProvider::new_http(url)),
                Err(e) => tracing::warn!(url = %url_str, error = %e, "Ignoring invalid failover RPC URL"),
            }
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = providers.len() - 1,
            "RPC gateway initialized"
        );

        Ok(Self {
            providers,
            events,
            config,
        })
    }

    /// Poll the node for account/chain changes until `shutdown` fires.
    pub fn spawn_event_watcher(&self, mut shutdown: ShutdownSignal) -> JoinHandle<()> {
        let gateway = self.clone();
        let interval = Duration::from_millis(self.config.event_poll_interval_ms);

        tokio::spawn(async move {
            let mut last_accounts = None;
            let mut last_chain = None;

            loop {
                gateway.poll_changes(&mut last_accounts, &mut last_chain).await;

                tokio::select! {
                    _ = sleep(interval) => {}
                    _ = shutdown.recv() => {
                        tracing::debug!("RPC event watcher stopped");
                        return;
                    }
                }
            }
        })
    }

    async fn poll_changes(
        &self,
        last_accounts: &mut Option<Vec<alloy::primitives::Address>>,
        last_chain: &mut Option<String>,
    ) {
        match self.request(RpcMethod::Accounts, json!([])).await {
            Ok(value) => match parse_accounts(RpcMethod::Accounts, value) {
                Ok(accounts) => {
                    // The first observation is the baseline, not a change.
                    if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                        let _ = self.events.send(ProviderEvent::AccountsChanged(accounts.clone()));
                    }
                    *last_accounts = Some(accounts);
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring malformed eth_accounts response"),
            },
            Err(e) => tracing::debug!(error = %e, "Account poll failed"),
        }

        match self.request(RpcMethod::ChainId, json!([])).await {
            Ok(value) => match parse_string(RpcMethod::ChainId, value) {
                Ok(chain) => {
                    if last_chain.as_ref().is_some_and(|prev| *prev != chain) {
                        let _ = self.events.send(ProviderEvent::ChainChanged(chain.clone()));
                    }
                    *last_chain = Some(chain);
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring malformed eth_chainId response"),
            },
            Err(e) => tracing::debug!(error = %e, "Chain poll failed"),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl ProviderGateway for RpcGateway {
    async fn request(&self, method: RpcMethod, params: Value) -> Result<Value, ProviderError> {
        let wire = match method {
            RpcMethod::RequestAccounts => RpcMethod::Accounts.as_str(),
            other => other.as_str(),
        };

        let mut last_error = None;
        for (i, provider) in self.providers.iter().enumerate() {
            match provider
                .raw_request::<Value, Value>(Cow::Borrowed(wire), params.clone())
                .await
            {
                Ok(result) => return Ok(result),
                Err(e) => {
                    // The node understood the call and refused it; another
                    // node would answer the same.
                    if let Some(payload) = e.as_error_resp() {
                        return Err(ProviderError::rpc(payload.code, payload.message.to_string()));
                    }
                    tracing::warn!(provider_idx = i, method = wire, error = %e, "RPC error, trying next provider");
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(ProviderError::Transport(format!(
            "All RPC providers failed: {}",
            last_error.unwrap_or_default()
        )))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for RpcGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcGateway")
            .field("rpc_url", &self.config.rpc_url)
            .field("failover_urls", &self.config.failover_urls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_invalid_primary_url() {
        let config = ProviderConfig {
            rpc_url: "not a url".to_string(),
            ..ProviderConfig::default()
        };
        let err = RpcGateway::new(config).unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[test]
    fn test_invalid_failover_is_skipped() {
        let mut config = test_config();
        config.failover_urls.push("::::".to_string());
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        let gateway = RpcGateway::new(config).unwrap();
        assert_eq!(gateway.providers.len(), 2);
    }

    #[tokio::test]
    async fn test_rpc_failover_exhausted() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        let gateway = RpcGateway::new(config).unwrap();

        // Nothing listens on either port.
        let err = gateway
            .request(RpcMethod::ChainId, json!([]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("All RPC providers failed"));
    }
}
