//! Provider gateway subsystem.
//!
//! # Data Flow
//! ```text
//! injected wallet / JSON-RPC node
//!     → ProviderGateway (request/response + event stream)
//!     → client.rs (typed calls, timeouts, error logging)
//!     → wallet session manager, transaction coordinator
//! ```
//!
//! # Design Decisions
//! - The gateway is handed to its consumers at construction; nothing reaches
//!   for a global provider object
//! - Gateways speak raw JSON values; decoding lives in `types.rs` so every
//!   implementation shares it
//! - Events are a broadcast stream so several listeners can subscribe

pub mod client;
pub mod memory;
pub mod rpc;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

pub use client::WalletClient;
pub use memory::InMemoryProvider;
pub use rpc::RpcGateway;
pub use types::{ProviderError, ProviderEvent, RpcMethod};

/// A wallet provider exposing an EIP-1193 style surface.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Whether a provider is actually present (e.g. an extension was injected).
    fn is_available(&self) -> bool {
        true
    }

    /// Send one request and wait for its result.
    async fn request(&self, method: RpcMethod, params: Value) -> Result<Value, ProviderError>;

    /// Subscribe to account and chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
