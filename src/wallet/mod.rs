//! Wallet session subsystem.
//!
//! # Data Flow
//! ```text
//! WalletSessionManager (manager.rs)
//!     → WalletClient (provider)
//!     → watch::Sender<WalletSession> (session.rs)
//! chains.rs / format.rs: names and display strings for the session
//! ```

pub mod chains;
pub mod format;
pub mod manager;
pub mod session;

pub use chains::{chain_display_name, chain_info, ChainInfo};
pub use format::{format_address, format_balance};
pub use manager::WalletSessionManager;
pub use session::{WalletSession, Web3User};
