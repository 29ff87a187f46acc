//! Auth API seam for the session manager
//!
//! Abstracts the backend auth endpoints so the manager can be tested against
//! scripted responses. The production implementation is
//! [`crate::api::ApiClient`].

use async_trait::async_trait;

use crate::api::types::AuthResponse;
use crate::error::Result;

use super::user::User;

/// The auth endpoints the session manager depends on
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// POST `/auth/login`
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse>;

    /// POST `/auth/register`
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse>;

    /// POST `/auth/logout` (best-effort; callers may ignore failure)
    async fn logout(&self) -> Result<()>;

    /// GET `/auth/me` using the stored bearer token
    async fn current_user(&self) -> Result<User>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify trait is object-safe
    fn _assert_object_safe(_: &dyn AuthApi) {}
}
