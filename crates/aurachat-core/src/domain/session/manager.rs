//! Session manager: auth state machine for the running client
//!
//! Lifecycle: constructed once at application start, `initialize()` runs the
//! startup reconciliation against persisted state, and afterwards the UI
//! invokes mutators sequentially. Auth mutators return [`AuthOutcome`] and
//! never propagate errors; startup failures silently reset to
//! unauthenticated.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::storage::{AUTH_TOKEN_KEY, DEMO_USER_KEY, KeyValueStore};

use super::auth_api::AuthApi;
use super::user::{User, UserPatch};
use super::validate;
use super::AuthOutcome;

/// Fallback message when a login fails without an API-supplied reason
const LOGIN_FALLBACK: &str = "Login failed";

/// Fallback message when a registration fails without an API-supplied reason
const REGISTER_FALLBACK: &str = "Registration failed";

#[derive(Debug, Clone)]
struct SessionState {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
}

/// Manager for the client's identity state
///
/// At most one of {demo session, token-backed session} is active at a time;
/// entering one clears the other's persisted artifact.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("SessionManager")
            .field("authenticated", &state.user.is_some())
            .field("loading", &state.loading)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// The manager starts in its loading state; call [`initialize`] once to
    /// reconcile with persisted session artifacts.
    ///
    /// [`initialize`]: Self::initialize
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store,
            state: Mutex::new(SessionState {
                user: None,
                token: None,
                loading: true,
            }),
        }
    }

    // ========== Startup reconciliation ==========

    /// Reconcile with persisted state
    ///
    /// A persisted demo record restores a demo session with no network call.
    /// Otherwise a persisted token is confirmed against `/auth/me`; any
    /// failure discards the token and leaves the manager unauthenticated.
    /// Errors never surface to the caller.
    pub async fn initialize(&self) {
        if let Some(user) = self.restore_demo_user().await {
            info!(username = %user.username, "Restored demo session");
            let mut state = self.state.lock().unwrap();
            state.user = Some(user);
            state.token = None;
            state.loading = false;
            return;
        }

        let token = match self.store.get(AUTH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        };

        if let Some(token) = token {
            match self.api.current_user().await {
                Ok(user) => {
                    info!(username = %user.username, "Restored session from stored token");
                    let mut state = self.state.lock().unwrap();
                    state.user = Some(user);
                    state.token = Some(token);
                }
                Err(e) => {
                    debug!(error = %e, "No active session; discarding stored token");
                    if let Err(e) = self.store.remove(AUTH_TOKEN_KEY).await {
                        warn!(error = %e, "Failed to discard stored token");
                    }
                }
            }
        }

        self.state.lock().unwrap().loading = false;
    }

    async fn restore_demo_user(&self) -> Option<User> {
        let raw = match self.store.get(DEMO_USER_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read stored demo user");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Corrupt demo user record; discarding");
                if let Err(e) = self.store.remove(DEMO_USER_KEY).await {
                    warn!(error = %e, "Failed to discard demo user record");
                }
                None
            }
        }
    }

    // ========== Auth mutators ==========

    /// Log in against the backend
    ///
    /// On success the returned token is persisted and the session becomes
    /// token-backed. On failure session state is unchanged.
    pub async fn login(&self, username: &str, password: &str) -> AuthOutcome {
        if let Err(error) = validate::validate_login(username, password) {
            return AuthOutcome::Failed { error };
        }

        match self.api.login(username, password).await {
            Ok(auth) => {
                self.enter_token_session(auth.user.clone(), auth.token).await;
                info!(username = %auth.user.username, "Login successful");
                AuthOutcome::Success { user: auth.user }
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                AuthOutcome::Failed {
                    error: e.user_message(LOGIN_FALLBACK),
                }
            }
        }
    }

    /// Register a new account
    ///
    /// Obviously malformed input fails before any network call. The success
    /// path is identical to [`login`].
    ///
    /// [`login`]: Self::login
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AuthOutcome {
        if let Err(error) = validate::validate_registration(username, email, password) {
            debug!(username = %username, "Registration rejected client-side");
            return AuthOutcome::Failed { error };
        }

        match self.api.register(username, email, password).await {
            Ok(auth) => {
                self.enter_token_session(auth.user.clone(), auth.token).await;
                info!(username = %auth.user.username, "Registration successful");
                AuthOutcome::Success { user: auth.user }
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                AuthOutcome::Failed {
                    error: e.user_message(REGISTER_FALLBACK),
                }
            }
        }
    }

    async fn enter_token_session(&self, user: User, token: String) {
        if let Err(e) = self.store.set(AUTH_TOKEN_KEY, &token).await {
            warn!(error = %e, "Failed to persist auth token");
        }
        // A token-backed session displaces any persisted demo session
        if let Err(e) = self.store.remove(DEMO_USER_KEY).await {
            warn!(error = %e, "Failed to clear demo user record");
        }

        let mut state = self.state.lock().unwrap();
        state.user = Some(user);
        state.token = Some(token);
    }

    /// Log out
    ///
    /// The local transition is client-authoritative: in-memory state and both
    /// persisted artifacts are cleared first. The backend is then notified
    /// best-effort; its failure is swallowed.
    pub async fn logout(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.user = None;
            state.token = None;
        }

        if let Err(e) = self.store.remove(AUTH_TOKEN_KEY).await {
            warn!(error = %e, "Failed to clear stored token");
        }
        if let Err(e) = self.store.remove(DEMO_USER_KEY).await {
            warn!(error = %e, "Failed to clear demo user record");
        }

        if let Err(e) = self.api.logout().await {
            debug!(error = %e, "Remote logout failed; local session already cleared");
        }
        info!("Logged out");
    }

    /// Start a local-only demo session; always succeeds, no network involved
    pub async fn demo_login(&self, display_name: Option<&str>) -> AuthOutcome {
        let user = User::demo(display_name);

        // A demo session displaces any persisted token-backed session
        if let Err(e) = self.store.remove(AUTH_TOKEN_KEY).await {
            warn!(error = %e, "Failed to clear stored token");
        }
        match serde_json::to_string(&user) {
            Ok(json) => {
                if let Err(e) = self.store.set(DEMO_USER_KEY, &json).await {
                    warn!(error = %e, "Failed to persist demo user record");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize demo user record"),
        }

        {
            let mut state = self.state.lock().unwrap();
            state.user = Some(user.clone());
            state.token = None;
        }

        info!(username = %user.username, "Demo session started");
        AuthOutcome::Success { user }
    }

    /// Shallow-merge a patch into the current user
    ///
    /// Demo sessions re-persist the merged record; for server-backed users
    /// remote sync is the caller's responsibility, and locally patched fields
    /// may be overwritten by the next authoritative fetch.
    pub async fn update_user(&self, patch: UserPatch) {
        let demo_record = {
            let mut state = self.state.lock().unwrap();
            let Some(user) = state.user.as_mut() else {
                debug!("update_user called with no active session");
                return;
            };
            user.apply(patch);
            user.is_demo.then(|| user.clone())
        };

        if let Some(user) = demo_record {
            match serde_json::to_string(&user) {
                Ok(json) => {
                    if let Err(e) = self.store.set(DEMO_USER_KEY, &json).await {
                        warn!(error = %e, "Failed to re-persist demo user record");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to serialize demo user record"),
            }
        }
    }

    // ========== Accessors ==========

    /// Whether a session is active
    ///
    /// Token-backed sessions additionally require a token; demo sessions do
    /// not carry one.
    pub fn is_authenticated(&self) -> bool {
        let state = self.state.lock().unwrap();
        match &state.user {
            Some(user) if user.is_demo => true,
            Some(_) => state.token.is_some(),
            None => false,
        }
    }

    /// Snapshot of the current user, if any
    pub fn current_user(&self) -> Option<User> {
        self.state.lock().unwrap().user.clone()
    }

    /// The in-memory bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.state.lock().unwrap().token.clone()
    }

    /// True only while the startup reconciliation is in progress
    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }
}
