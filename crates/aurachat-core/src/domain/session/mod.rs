//! Session domain: identity state for the running client
//!
//! The [`SessionManager`] owns the current user record, the bearer token, and
//! the startup loading flag. UI layers hold a reference to one explicitly
//! constructed manager instance and read snapshots; they never mutate session
//! state directly.

mod auth_api;
mod manager;
mod user;
pub(crate) mod validate;

pub use auth_api::AuthApi;
pub use manager::SessionManager;
pub use user::{User, UserPatch};

/// Outcome of an auth mutator (`login`, `register`, `demo_login`)
///
/// Auth operations never surface errors as `Err`; failures are carried here
/// as a displayable message.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// The session is established; the user record is current
    Success { user: User },
    /// The attempt failed and session state is unchanged
    Failed { error: String },
}

impl AuthOutcome {
    /// Whether the operation established a session
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The established user, if any
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Success { user } => Some(user),
            Self::Failed { .. } => None,
        }
    }

    /// The failure message, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }
}
