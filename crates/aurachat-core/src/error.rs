//! Error types for the AuraChat client

use thiserror::Error;

/// Result type alias using the client's Error
pub type Result<T> = std::result::Result<T, Error>;

/// AuraChat client error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}. Check your internet connection and the API base URL.")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The human-readable message to show for a failed auth operation.
    ///
    /// API-reported and validation messages pass through unchanged; transport
    /// and parse failures collapse to the per-operation fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            Self::InvalidInput(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Whether this error came from an unauthorized/invalid-auth response.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if matches!(*status, 401 | 422))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_api_message() {
        let err = Error::Api {
            status: 401,
            message: "Invalid username or password".to_string(),
        };
        assert_eq!(err.user_message("Login failed"), "Invalid username or password");
    }

    #[test]
    fn test_user_message_falls_back_on_empty_body() {
        let err = Error::Api {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message("Login failed"), "Login failed");
    }

    #[test]
    fn test_user_message_passes_validation_text() {
        let err = Error::InvalidInput("Password must be at least 6 characters long".to_string());
        assert_eq!(
            err.user_message("Registration failed"),
            "Password must be at least 6 characters long"
        );
    }

    #[test]
    fn test_is_unauthorized() {
        let unauthorized = Error::Api {
            status: 401,
            message: "expired".to_string(),
        };
        let unprocessable = Error::Api {
            status: 422,
            message: "bad token".to_string(),
        };
        let server = Error::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(unprocessable.is_unauthorized());
        assert!(!server.is_unauthorized());
    }
}
