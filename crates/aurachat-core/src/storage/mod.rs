//! Local key-value persistence
//!
//! The client persists three small pieces of state between runs: the bearer
//! token, a serialized demo-user record, and the explicit theme choice. The
//! [`KeyValueStore`] trait abstracts over the storage backend so managers can
//! be tested against an in-memory implementation.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;

/// Key under which the auth bearer token is persisted.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Key under which a serialized demo-user record is persisted.
///
/// At most one of `auth_token`/`demo_user` is meaningfully populated at a
/// time; entering one kind of session clears the other's key.
pub const DEMO_USER_KEY: &str = "demo_user";

/// Key under which the explicit theme choice is persisted.
///
/// Absent when the user has never made an explicit choice.
pub const THEME_KEY: &str = "theme";

/// Storage trait for small persisted client state
///
/// Reads of a missing key return `None`; removing a missing key succeeds.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`, if present
    async fn remove(&self, key: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify trait is object-safe
    fn _assert_object_safe(_: &dyn KeyValueStore) {}
}
