//! HTTP client implementation
//!
//! Thin wrapper around `reqwest` that attaches the stored bearer token to
//! every request and maps error responses into the client error taxonomy.
//! Any 401/422 response discards the persisted token before the error is
//! returned; navigation and state resets stay with the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::domain::session::{AuthApi, User};
use crate::domain::theme::Theme;
use crate::error::{Error, Result};
use crate::storage::{AUTH_TOKEN_KEY, KeyValueStore};

use super::types::{
    AuthResponse, ChangePasswordRequest, CreatePostRequest, CreatePostResponse,
    CurrentUserResponse, FeedPage, LoginRequest, MessageResponse, Post, Profile, ProfileUpdate,
    RegisterRequest, ThemeUpdateRequest,
};

/// Default API base URL for a local backend
const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// AuraChat API client
///
/// Cloneable handle; clones share the HTTP connection pool and the token
/// store.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for creating an ApiClient
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout_secs: None,
            store: None,
        }
    }

    /// Set the API base URL (defaults to a local backend)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the key-value store holding the bearer token
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the ApiClient
    pub fn build(self) -> Result<ApiClient> {
        let store = self
            .store
            .ok_or_else(|| Error::Config("A key-value store is required".to_string()))?;

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::Network)?;

        Ok(ApiClient {
            http,
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            store,
        })
    }
}

impl ApiClient {
    /// Create a client from configuration and a token store
    pub fn new(config: &ApiConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        ApiClientBuilder::new()
            .base_url(config.base_url.clone())
            .timeout_secs(config.timeout_secs)
            .store(store)
            .build()
    }

    /// Create a new builder for ApiClient
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the stored bearer token, if any
    async fn bearer_token(&self) -> Option<String> {
        match self.store.get(AUTH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    /// Send a request with the bearer token attached when present
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = match self.bearer_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(Error::Network)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        self.handle_error_response(status, response).await
    }

    /// Map an error response, discarding the stored token on auth rejection
    async fn handle_error_response(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let body = response.text().await.unwrap_or_default();
        let message =
            extract_message(&body).unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

        let error = Error::Api {
            status: status.as_u16(),
            message,
        };

        if error.is_unauthorized() {
            debug!(status = status.as_u16(), "Auth rejected; discarding stored token");
            if let Err(e) = self.store.remove(AUTH_TOKEN_KEY).await {
                warn!(error = %e, "Failed to discard stored token");
            }
        }

        Err(error)
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }

    // ========== Auth endpoints beyond the AuthApi seam ==========

    /// Change the current user's password
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        debug!("Sending change-password request");
        let response = self
            .send(
                self.http
                    .post(self.url("/auth/change-password"))
                    .json(&ChangePasswordRequest {
                        current_password: current_password.to_string(),
                        new_password: new_password.to_string(),
                    }),
            )
            .await?;
        let _: MessageResponse = Self::parse(response).await?;
        Ok(())
    }

    // ========== Profile endpoints ==========

    /// Fetch the current user's profile
    pub async fn get_profile(&self) -> Result<User> {
        let response = self.send(self.http.get(self.url("/profile"))).await?;
        Self::parse(response).await
    }

    /// Update profile fields; only the provided fields change
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        debug!("Sending profile update");
        let response = self
            .send(self.http.put(self.url("/profile")).json(update))
            .await?;
        Self::parse(response).await
    }

    /// Persist the theme choice to the user's remote profile
    ///
    /// The theme manager itself is purely local; this endpoint exists for the
    /// profile surface only.
    pub async fn update_theme(&self, theme: Theme) -> Result<()> {
        let response = self
            .send(
                self.http
                    .put(self.url("/profile/theme"))
                    .json(&ThemeUpdateRequest {
                        theme: theme.as_str().to_string(),
                    }),
            )
            .await?;
        let _: MessageResponse = Self::parse(response).await?;
        Ok(())
    }

    // ========== Post endpoints ==========

    /// Fetch one page of the post feed
    pub async fn feed(&self, page: u32) -> Result<FeedPage> {
        let response = self
            .send(self.http.get(self.url("/posts")).query(&[("page", page)]))
            .await?;
        Self::parse(response).await
    }

    /// Create a new post
    pub async fn create_post(&self, content: &str, image: Option<&str>) -> Result<Post> {
        if content.trim().is_empty() {
            return Err(Error::InvalidInput("Content is required".to_string()));
        }
        let response = self
            .send(
                self.http
                    .post(self.url("/posts"))
                    .json(&CreatePostRequest {
                        content: content.to_string(),
                        image: image.map(str::to_string),
                    }),
            )
            .await?;
        let created: CreatePostResponse = Self::parse(response).await?;
        Ok(created.post)
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        debug!(username = %username, "Sending login request");
        let response = self
            .send(self.http.post(self.url("/auth/login")).json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            }))
            .await?;
        Self::parse(response).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse> {
        debug!(username = %username, "Sending registration request");
        let response = self
            .send(
                self.http
                    .post(self.url("/auth/register"))
                    .json(&RegisterRequest {
                        username: username.to_string(),
                        email: email.to_string(),
                        password: password.to_string(),
                    }),
            )
            .await?;
        Self::parse(response).await
    }

    async fn logout(&self) -> Result<()> {
        let response = self.send(self.http.post(self.url("/auth/logout"))).await?;
        let _: MessageResponse = Self::parse(response).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User> {
        let response = self.send(self.http.get(self.url("/auth/me"))).await?;
        let wrapped: CurrentUserResponse = Self::parse(response).await?;
        Ok(wrapped.user)
    }
}

/// Pull a human-readable message out of an error response body
///
/// The backend reports failures under either a `message` or an `error` key.
fn extract_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("message")
        .or_else(|| json.get("error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn test_store() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_client_builder() {
        let client = ApiClient::builder()
            .base_url("https://api.example.com/")
            .timeout_secs(5)
            .store(test_store())
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_client_builder_requires_store() {
        let result = ApiClient::builder().base_url("https://example.com").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_client_defaults_to_local_backend() {
        let client = ApiClient::builder().store(test_store()).build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiClient>();
    }

    #[test]
    fn test_extract_message_variants() {
        assert_eq!(
            extract_message(r#"{"message": "Invalid username or password"}"#).as_deref(),
            Some("Invalid username or password")
        );
        assert_eq!(
            extract_message(r#"{"error": "User not found"}"#).as_deref(),
            Some("User not found")
        );
        assert_eq!(extract_message("<html>bad gateway</html>"), None);
        assert_eq!(extract_message(r#"{"detail": 42}"#), None);
    }

    #[tokio::test]
    async fn test_create_post_rejects_empty_content() {
        let client = ApiClient::builder().store(test_store()).build().unwrap();
        let result = client.create_post("   ", None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
