//! Request and response payloads for the AuraChat API

use serde::{Deserialize, Serialize};

use crate::domain::session::User;

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Password change request body
#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Successful login/registration response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response wrapper for `GET /auth/me`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUserResponse {
    pub user: User,
}

/// Response carrying only a status message
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Partial profile update; only present fields are sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_preference: Option<String>,
}

/// Profile record as served by `PUT /profile`
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub theme_preference: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Theme update request body for `PUT /profile/theme`
#[derive(Debug, Clone, Serialize)]
pub struct ThemeUpdateRequest {
    pub theme: String,
}

/// A post in the feed
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_username: Option<String>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comments: i64,
}

/// One page of the post feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub pages: i64,
    #[serde(default)]
    pub current_page: i64,
}

/// Post creation request body
#[derive(Debug, Clone, Serialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Response wrapper for `POST /posts`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostResponse {
    pub post: Post,
    #[serde(default)]
    pub message: Option<String>,
}
