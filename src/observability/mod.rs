//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! provider client, session manager, coordinator, monitors
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//! ```

pub mod logging;
pub mod metrics;
