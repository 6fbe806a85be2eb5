//! Durable key-value storage for the session snapshot.
//!
//! The store holds three keys: `users`, `patients` and `logged_in`, each a
//! JSON string. `snapshot` layers the serialization contract on top
//! (binary-handle stripping, timestamp rehydration, seeded fallbacks).

pub mod snapshot;
pub mod sqlite;

pub use sqlite::SqliteStore;

/// Serialized user set.
pub const USERS_KEY: &str = "users";
/// Serialized patient sequence (images stripped of binary handles).
pub const PATIENTS_KEY: &str = "patients";
/// Login flag, persisted across restarts.
pub const LOGGED_IN_KEY: &str = "logged_in";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("internal lock error")]
    LockPoisoned,
}

/// Minimal durable string store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Overwrites any prior value at `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
