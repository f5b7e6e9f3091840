//! Client-side persistence.
//!
//! # Data Flow
//! ```text
//! SessionStore (session.rs)
//!     → User ⇄ JSON under the session key
//!     → KeyValueStore (store.rs): MemoryStore | FileStore
//! ```

pub mod session;
pub mod store;

pub use session::SessionStore;
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};
