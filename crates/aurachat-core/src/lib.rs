//! AuraChat Client Core Library
//!
//! This crate provides the client-side core for AuraChat, including:
//! - Session management (login, registration, logout, demo mode)
//! - Theme preference management with system-theme fallback
//! - REST API client for the AuraChat backend
//! - Local key-value persistence for tokens and preferences
//! - Configuration with file persistence

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::ApiClient;
    pub use crate::config::Config;
    pub use crate::domain::session::{AuthOutcome, SessionManager, User};
    pub use crate::domain::theme::{Theme, ThemeManager};
    pub use crate::error::{Error, Result};
}
