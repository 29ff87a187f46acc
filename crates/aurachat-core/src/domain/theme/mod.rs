//! Theme domain: presentation-mode state for the running client
//!
//! The [`ThemeManager`] owns the resolved theme and its persistence. The
//! platform supplies two collaborators: a [`SystemThemeProbe`] for the
//! system-wide appearance and a [`ThemeTarget`] that reflects every resolved
//! theme change into the presentation layer.

mod manager;

pub use manager::ThemeManager;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Visual presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The opposite mode
    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Check if this is the dark mode
    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::Light
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Probe for the platform's system-wide appearance preference
pub trait SystemThemeProbe: Send + Sync {
    /// The system preference, or `None` when the platform cannot report one
    fn detect(&self) -> Option<Theme>;
}

/// Sink that reflects the resolved theme into the presentation layer
///
/// Invoked on every resolved-theme change; the stand-in for setting a
/// document-level attribute/class pair that styling reacts to.
pub trait ThemeTarget: Send + Sync {
    fn apply(&self, theme: Theme);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_from_str() {
        assert_eq!(Theme::from_str("light"), Some(Theme::Light));
        assert_eq!(Theme::from_str("DARK"), Some(Theme::Dark));
        assert_eq!(Theme::from_str("blue"), None);
        assert_eq!(Theme::from_str(""), None);
    }

    #[test]
    fn test_theme_toggled() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn test_theme_serde_forms() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), r#""dark""#);
        let parsed: Theme = serde_json::from_str(r#""light""#).unwrap();
        assert_eq!(parsed, Theme::Light);
    }
}
