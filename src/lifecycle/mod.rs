//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every ShutdownSignal resolves
//!     → receipt monitors, event listeners and watchers return
//!
//! Busy (busy.rs):
//!     connect / submit claim a flag for their duration
//!     → a concurrent second call fails fast
//!
//! Signals (signals.rs):
//!     SIGINT → trigger shutdown
//! ```

pub mod busy;
pub mod shutdown;
pub mod signals;

pub use busy::BusyGuard;
pub use shutdown::{Shutdown, ShutdownSignal};
