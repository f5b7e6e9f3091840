//! Wallet and authentication shell library.
//!
//! Connects to an injected wallet provider (or a JSON-RPC node), tracks the
//! wallet session, estimates and submits native-currency transfers, monitors
//! them to a terminal status, and keeps the logged-in user across runs.

// Core subsystems
pub mod provider;
pub mod transactions;
pub mod wallet;

// Sign-in and persistence
pub mod app;
pub mod identity;
pub mod storage;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use app::AppShell;
pub use config::ShellConfig;
pub use error::{WalletError, WalletResult};
pub use lifecycle::Shutdown;
