//! Theme manager: resolved-theme state, persistence, and overlap guard
//!
//! Startup precedence: explicit persisted preference > system preference >
//! light. Once the user makes an explicit choice, system-preference changes
//! no longer move the theme. Persistence failures are logged and ignored;
//! the in-memory theme stays authoritative for the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::storage::{KeyValueStore, THEME_KEY};

use super::{SystemThemeProbe, Theme, ThemeTarget};

#[derive(Debug, Clone, Copy)]
struct ThemeState {
    theme: Theme,
    explicit: bool,
}

/// Manager for the client's presentation mode
pub struct ThemeManager {
    store: Arc<dyn KeyValueStore>,
    probe: Arc<dyn SystemThemeProbe>,
    target: Arc<dyn ThemeTarget>,
    state: Mutex<ThemeState>,
    changing: AtomicBool,
}

/// Releases the in-flight flag on every exit path
struct ChangeGuard<'a>(&'a AtomicBool);

impl Drop for ChangeGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("ThemeManager")
            .field("theme", &state.theme)
            .field("explicit", &state.explicit)
            .finish_non_exhaustive()
    }
}

impl ThemeManager {
    /// Create a new theme manager
    ///
    /// Starts at light with no explicit preference; call [`initialize`] once
    /// to resolve the startup theme.
    ///
    /// [`initialize`]: Self::initialize
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        probe: Arc<dyn SystemThemeProbe>,
        target: Arc<dyn ThemeTarget>,
    ) -> Self {
        Self {
            store,
            probe,
            target,
            state: Mutex::new(ThemeState {
                theme: Theme::Light,
                explicit: false,
            }),
            changing: AtomicBool::new(false),
        }
    }

    /// Resolve the startup theme and apply it to the target
    ///
    /// An invalid persisted value counts as no explicit choice.
    pub async fn initialize(&self) {
        let stored = match self.store.get(THEME_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read theme preference");
                None
            }
        };

        let (theme, explicit) = match stored.as_deref().and_then(Theme::from_str) {
            Some(theme) => (theme, true),
            None => (self.probe.detect().unwrap_or_default(), false),
        };

        {
            let mut state = self.state.lock().unwrap();
            state.theme = theme;
            state.explicit = explicit;
        }
        self.target.apply(theme);
        debug!(theme = %theme, explicit, "Theme resolved");
    }

    // ========== Mutators ==========

    /// Flip light/dark
    ///
    /// No-op while a previous change is still persisting, so rapid repeated
    /// calls cannot double-toggle.
    pub async fn toggle_theme(&self) {
        if self.changing.swap(true, Ordering::SeqCst) {
            debug!("Theme change already in flight; ignoring toggle");
            return;
        }
        let _guard = ChangeGuard(&self.changing);

        let next = {
            let mut state = self.state.lock().unwrap();
            state.theme = state.theme.toggled();
            state.explicit = true;
            state.theme
        };

        self.target.apply(next);
        self.persist(next).await;
        info!(theme = %next, "Theme toggled");
    }

    /// Set an explicit preference
    ///
    /// No-op when equal to the current theme or while a change is in flight.
    pub async fn set_preference(&self, theme: Theme) {
        if self.theme() == theme {
            return;
        }
        if self.changing.swap(true, Ordering::SeqCst) {
            debug!("Theme change already in flight; ignoring preference");
            return;
        }
        let _guard = ChangeGuard(&self.changing);

        {
            let mut state = self.state.lock().unwrap();
            state.theme = theme;
            state.explicit = true;
        }

        self.target.apply(theme);
        self.persist(theme).await;
        info!(theme = %theme, "Theme preference set");
    }

    /// Entry point for system-preference change notifications
    ///
    /// Follows the system only while no explicit persisted preference exists;
    /// the persisted key is consulted at notification time.
    pub async fn system_theme_changed(&self, system: Theme) {
        let explicit = match self.store.get(THEME_KEY).await {
            Ok(stored) => stored.as_deref().and_then(Theme::from_str).is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read theme preference");
                self.state.lock().unwrap().explicit
            }
        };

        if explicit {
            debug!("Ignoring system theme change; explicit preference set");
            return;
        }

        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.theme == system {
                false
            } else {
                state.theme = system;
                true
            }
        };

        if changed {
            self.target.apply(system);
            info!(theme = %system, "Theme follows system preference");
        }
    }

    async fn persist(&self, theme: Theme) {
        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()).await {
            warn!(error = %e, "Failed to persist theme preference");
        }
    }

    // ========== Accessors ==========

    /// The resolved, displayable theme
    pub fn theme(&self) -> Theme {
        self.state.lock().unwrap().theme
    }

    /// Whether the dark mode is active
    pub fn is_dark(&self) -> bool {
        self.theme().is_dark()
    }

    /// Whether a change is currently in flight
    pub fn is_changing(&self) -> bool {
        self.changing.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Records every applied theme
    #[derive(Default)]
    struct RecordingTarget {
        applied: Mutex<Vec<Theme>>,
    }

    impl RecordingTarget {
        fn applied(&self) -> Vec<Theme> {
            self.applied.lock().unwrap().clone()
        }
    }

    impl ThemeTarget for RecordingTarget {
        fn apply(&self, theme: Theme) {
            self.applied.lock().unwrap().push(theme);
        }
    }

    struct FixedProbe(Option<Theme>);

    impl SystemThemeProbe for FixedProbe {
        fn detect(&self) -> Option<Theme> {
            self.0
        }
    }

    /// Store whose writes block until released, to hold a change in flight
    struct GatedStore {
        inner: MemoryStore,
        release: Notify,
    }

    impl GatedStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for GatedStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.release.notified().await;
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }
    }

    fn manager_with(
        store: Arc<dyn KeyValueStore>,
        system: Option<Theme>,
    ) -> (ThemeManager, Arc<RecordingTarget>) {
        let target = Arc::new(RecordingTarget::default());
        let manager = ThemeManager::new(store, Arc::new(FixedProbe(system)), target.clone());
        (manager, target)
    }

    #[tokio::test]
    async fn test_explicit_preference_beats_system() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_KEY, "dark").await.unwrap();
        let (manager, target) = manager_with(store, Some(Theme::Light));

        manager.initialize().await;

        assert_eq!(manager.theme(), Theme::Dark);
        assert_eq!(target.applied(), vec![Theme::Dark]);
    }

    #[tokio::test]
    async fn test_system_preference_used_when_no_explicit_choice() {
        let store = Arc::new(MemoryStore::new());
        let (manager, _) = manager_with(store, Some(Theme::Dark));

        manager.initialize().await;

        assert_eq!(manager.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_defaults_to_light() {
        let store = Arc::new(MemoryStore::new());
        let (manager, _) = manager_with(store, None);

        manager.initialize().await;

        assert_eq!(manager.theme(), Theme::Light);
        assert!(!manager.is_dark());
    }

    #[tokio::test]
    async fn test_invalid_stored_value_counts_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_KEY, "blue").await.unwrap();
        let (manager, _) = manager_with(store, Some(Theme::Dark));

        manager.initialize().await;

        assert_eq!(manager.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_original() {
        let store = Arc::new(MemoryStore::new());
        let (manager, target) = manager_with(store.clone(), None);
        manager.initialize().await;

        manager.toggle_theme().await;
        assert_eq!(manager.theme(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));

        manager.toggle_theme().await;
        assert_eq!(manager.theme(), Theme::Light);
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("light"));

        assert_eq!(
            target.applied(),
            vec![Theme::Light, Theme::Dark, Theme::Light]
        );
    }

    #[tokio::test]
    async fn test_toggle_is_noop_while_change_in_flight() {
        let store = Arc::new(GatedStore::new());
        let target = Arc::new(RecordingTarget::default());
        let manager = Arc::new(ThemeManager::new(
            store.clone(),
            Arc::new(FixedProbe(None)),
            target.clone(),
        ));
        manager.initialize().await;

        let first = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.toggle_theme().await })
        };
        // Let the first toggle reach its blocked persistence write
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(manager.is_changing());

        // Second toggle while the first is persisting: no double flip
        manager.toggle_theme().await;
        assert_eq!(manager.theme(), Theme::Dark);

        store.release.notify_one();
        first.await.unwrap();

        assert_eq!(manager.theme(), Theme::Dark);
        assert!(!manager.is_changing());
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_set_preference_noop_when_equal() {
        let store = Arc::new(MemoryStore::new());
        let (manager, target) = manager_with(store.clone(), None);
        manager.initialize().await;

        manager.set_preference(Theme::Light).await;

        // Nothing persisted, nothing re-applied beyond startup
        assert!(store.get(THEME_KEY).await.unwrap().is_none());
        assert_eq!(target.applied(), vec![Theme::Light]);
    }

    #[tokio::test]
    async fn test_set_preference_persists() {
        let store = Arc::new(MemoryStore::new());
        let (manager, _) = manager_with(store.clone(), None);
        manager.initialize().await;

        manager.set_preference(Theme::Dark).await;

        assert_eq!(manager.theme(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_system_change_followed_without_explicit_choice() {
        let store = Arc::new(MemoryStore::new());
        let (manager, target) = manager_with(store, Some(Theme::Light));
        manager.initialize().await;

        manager.system_theme_changed(Theme::Dark).await;

        assert_eq!(manager.theme(), Theme::Dark);
        assert_eq!(target.applied(), vec![Theme::Light, Theme::Dark]);
    }

    #[tokio::test]
    async fn test_system_change_ignored_after_explicit_choice() {
        let store = Arc::new(MemoryStore::new());
        let (manager, _) = manager_with(store, None);
        manager.initialize().await;
        manager.set_preference(Theme::Light).await;
        manager.set_preference(Theme::Dark).await;

        manager.system_theme_changed(Theme::Light).await;

        assert_eq!(manager.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_authoritative() {
        struct FailingStore;

        #[async_trait]
        impl KeyValueStore for FailingStore {
            async fn get(&self, _key: &str) -> Result<Option<String>> {
                Ok(None)
            }
            async fn set(&self, _key: &str, _value: &str) -> Result<()> {
                Err(crate::error::Error::Storage("disk full".to_string()))
            }
            async fn remove(&self, _key: &str) -> Result<()> {
                Ok(())
            }
        }

        let (manager, target) = manager_with(Arc::new(FailingStore), None);
        manager.initialize().await;

        manager.toggle_theme().await;

        assert_eq!(manager.theme(), Theme::Dark);
        assert!(!manager.is_changing());
        assert_eq!(target.applied(), vec![Theme::Light, Theme::Dark]);
    }
}
