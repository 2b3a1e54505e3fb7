//! Session bookkeeping and the persistent message log.
//!
//! [`SessionStore`] is the storage contract; [`SqliteSessionStore`] is the
//! durable implementation and [`InMemorySessionStore`] the test double.
//! [`SessionManager`] layers the idempotent "ensure + touch" lifecycle on top.

/// Session lifecycle on top of a store.
pub mod manager;
/// The SQLite-backed store.
pub mod sqlite;
/// The store contract and the in-memory implementation.
pub mod store;

pub use manager::SessionManager;
pub use sqlite::SqliteSessionStore;
pub use store::{InMemorySessionStore, SessionStore};
