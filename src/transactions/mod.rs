//! Transaction coordinator subsystem.
//!
//! # Data Flow
//! ```text
//! DraftEstimator (draft.rs)
//!     → debounced estimate_gas
//! TransactionCoordinator (coordinator.rs)
//!     → validate (validation.rs, units.rs)
//!     → eth_accounts → eth_sendTransaction → record (Pending)
//!     → ReceiptMonitor (monitor.rs)
//!         → poll eth_getTransactionReceipt → Confirmed / Failed
//! history() → display.rs for relative time, direction, explorer links
//! ```
//!
//! # Design Decisions
//! - Records are keyed by hash in a `DashMap` shared with the monitors
//! - A record leaves `Pending` at most once
//! - Amounts stay decimal text at the edges and `U256` wei inside

pub mod coordinator;
pub mod display;
pub mod draft;
pub mod monitor;
pub mod types;
pub mod units;
pub mod validation;

pub use coordinator::TransactionCoordinator;
pub use draft::{DraftEstimator, DraftPhase, DraftState};
pub use monitor::{MonitorOutcome, ReceiptMonitor};
pub use types::{GasEstimate, TransactionRecord, TransactionRequest, TransactionStatus};
pub use validation::{validate_address, validate_amount};
