//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every
//! section has defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the wallet shell.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    /// Wallet provider connection.
    pub provider: ProviderConfig,

    /// Transaction estimation, submission and monitoring.
    pub transactions: TransactionConfig,

    /// Persisted login session.
    pub storage: StorageConfig,

    /// Sign-in adapters.
    pub identity: IdentityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Provider gateway configuration (used by the JSON-RPC gateway).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Timeout for calls that never prompt the user, in seconds. 0 disables.
    pub rpc_timeout_secs: u64,

    /// How often the node is polled for account/chain changes.
    pub event_poll_interval_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
            event_poll_interval_ms: 4000,
        }
    }
}

/// Identity adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    /// OAuth client id for Google sign-in; sign-in is unavailable without it.
    pub google_client_id: Option<String>,
}

/// Transaction coordinator configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransactionConfig {
    /// Quiet period after the last draft edit before estimating gas.
    pub estimate_debounce_ms: u64,

    /// Delay between submission and the first receipt poll.
    pub receipt_initial_delay_ms: u64,

    /// Delay between receipt polls while a transaction is pending.
    pub receipt_poll_interval_ms: u64,

    /// Stop polling after this many attempts; unbounded when absent.
    pub receipt_max_attempts: Option<u32>,

    /// Recorded errors are cleared after this long. 0 keeps them.
    pub error_clear_ms: u64,

    /// Decimal places used when rendering ether amounts.
    pub display_decimals: u32,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            estimate_debounce_ms: 500,
            receipt_initial_delay_ms: 2000,
            receipt_poll_interval_ms: 5000,
            receipt_max_attempts: None,
            error_clear_ms: 5000,
            display_decimals: 4,
        }
    }
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the key-value store; in-memory when absent.
    pub session_path: Option<String>,

    /// Key the logged-in user is stored under.
    pub session_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_path: None,
            session_key: "wawee_user".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
