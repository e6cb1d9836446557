//! SQLite persistence for the points auction engine.
//!
//! One authoritative store with two jobs:
//! - the `engine_state` document, rewritten after every state-mutating
//!   operation, read once at startup for crash recovery
//! - the append-only `lot_results` log, one row per winning bid (and one
//!   empty row per unsold lot) for audit and manual reconciliation
//!
//! This crate ONLY handles persistence; it knows nothing about timers or
//! protocol rules.

mod schema;
mod store;

pub use schema::{StorageConfig, init_schema};
pub use store::SqliteStore;
