//! Signed-in user and session token.
//!
//! # Session lifecycle
//!
//! ```text
//!              register / login ok
//!   Anonymous ─────────────────────► Authenticated
//!       ▲                                  │
//!       └──── logout / profile refresh ◄───┘
//!                   rejected
//! ```
//!
//! The token lives in three places that are kept in step: this store, the
//! transport (as the bearer token), and the [`TokenStore`] so the next run
//! can pick the session back up through [`UserStore::initialize_auth`].

use std::sync::Arc;

use emporium_core::{ProfileUpdate, User};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use super::{ActionStatus, StatusTracker};
use crate::api::Transport;
use crate::error::ApiError;
use crate::services;
use crate::services::user::{AuthSession, Credentials, Registration};
use crate::session::TokenStore;
use crate::telemetry;

/// Whether a user is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Current user profile and the token that authenticates it.
pub struct UserStore<T, S> {
    api: Arc<T>,
    tokens: S,
    user: Option<User>,
    token: Option<SecretString>,
    status: StatusTracker,
}

impl<T: Transport, S: TokenStore> UserStore<T, S> {
    /// Create the store, restoring any token persisted by a previous run.
    ///
    /// The restored token is not validated or attached to the transport
    /// until [`initialize_auth`](Self::initialize_auth) runs.
    #[must_use]
    pub fn new(api: Arc<T>, tokens: S) -> Self {
        let token = tokens.load().unwrap_or_else(|e| {
            warn!(error = %e, "Could not restore session token, starting signed out");
            None
        });

        Self {
            api,
            tokens,
            user: None,
            token,
            status: StatusTracker::new("user"),
        }
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Registration failed".
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&mut self, registration: &Registration) -> Result<User, ApiError> {
        let _loading = self.status.begin();
        match services::user::register(&*self.api, registration).await {
            Ok(session) => {
                open_session(&*self.api, &self.tokens, &session).await;
                self.user = Some(session.user.clone());
                self.token = Some(session.token);
                self.status.succeed("register");
                info!(user_id = %session.user.id, "Registered");
                Ok(session.user)
            }
            Err(e) => Err(self.status.fail("register", "Registration failed", e)),
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Login failed".
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<User, ApiError> {
        let _loading = self.status.begin();
        match services::user::login(&*self.api, credentials).await {
            Ok(session) => {
                open_session(&*self.api, &self.tokens, &session).await;
                self.user = Some(session.user.clone());
                self.token = Some(session.token);
                self.status.succeed("login");
                info!(user_id = %session.user.id, "Logged in");
                Ok(session.user)
            }
            Err(e) => Err(self.status.fail("login", "Login failed", e)),
        }
    }

    /// Refresh the profile of the token holder.
    ///
    /// Does nothing without a token. A rejected refresh signs the user out
    /// rather than reporting an error, and the previous error message is
    /// left untouched either way.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&mut self) -> Option<User> {
        if self.token.is_none() {
            return None;
        }

        let loading = self.status.begin_quiet();
        let err = match services::user::get_profile(&*self.api).await {
            Ok(user) => {
                telemetry::set_sentry_user(&user);
                self.user = Some(user.clone());
                self.status.succeed("fetch_profile");
                return Some(user);
            }
            Err(e) => e,
        };
        drop(loading);

        warn!(error = %err, "Profile refresh failed, signing out");
        telemetry::action_breadcrumb("user", "fetch_profile", Some("session expired"));
        self.logout().await;
        None
    }

    /// Change profile fields.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Profile update failed".
    #[instrument(skip(self, update))]
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let _loading = self.status.begin();
        match services::user::update_profile(&*self.api, update).await {
            Ok(user) => {
                self.user = Some(user.clone());
                self.status.succeed("update_profile");
                Ok(user)
            }
            Err(e) => Err(self.status.fail("update_profile", "Profile update failed", e)),
        }
    }

    /// Sign out locally: forget the profile and token everywhere.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) {
        self.user = None;
        self.token = None;
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear persisted session token");
        }
        self.api.set_bearer_token(None).await;
        telemetry::clear_sentry_user();
        info!("Logged out");
    }

    /// Resume a persisted session: attach the restored token and validate
    /// it by fetching the profile.
    #[instrument(skip(self))]
    pub async fn initialize_auth(&mut self) -> Option<User> {
        let token = self.token.clone()?;
        self.api.set_bearer_token(Some(token)).await;
        self.fetch_profile().await
    }

    #[must_use]
    pub const fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// A token is held and its profile has been loaded.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    #[must_use]
    pub const fn session_state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    #[must_use]
    pub fn status(&self) -> ActionStatus {
        self.status.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ActionStatus> {
        self.status.subscribe()
    }
}

/// Attach and persist a freshly issued token.
async fn open_session<T: Transport, S: TokenStore>(api: &T, tokens: &S, session: &AuthSession) {
    api.set_bearer_token(Some(session.token.clone())).await;
    if let Err(e) = tokens.save(&session.token) {
        warn!(error = %e, "Failed to persist session token, session will not survive restart");
    }
    telemetry::set_sentry_user(&session.user);
}
