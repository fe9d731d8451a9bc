//! Auth session manager: the single authority on whether a session exists.
//!
//! # Session lifecycle
//! `Anonymous` --login--> `Authenticated` --logout / failed validation--> `Anonymous`.
//! An expired token is indistinguishable from no session at all.

use serde::de::IgnoredAny;

use userdesk_core::{
    AuthError, LoginCredentials, LoginResponse, RefreshRequest, RefreshResponse, UserProfile,
};

use crate::http::{RequestClient, RequestOptions};
use crate::session::SessionStore;

const LOGIN_PATH: &str = "/auth/login";
const VALIDATE_PATH: &str = "/auth/validate";
const REFRESH_PATH: &str = "/auth/refresh";

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(UserProfile),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(profile) => Some(profile),
            Self::Anonymous => None,
        }
    }
}

/// Login, logout, validation and refresh layered on the session store and the
/// request client.
#[derive(Debug, Clone)]
pub struct AuthSession {
    client: RequestClient,
    store: SessionStore,
}

impl AuthSession {
    pub fn new(client: RequestClient, store: SessionStore) -> Self {
        Self { client, store }
    }

    /// Exchange credentials for a session. Nothing is persisted on failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, AuthError> {
        let credentials = LoginCredentials::new(username, password);

        let response: LoginResponse = self
            .client
            .post(LOGIN_PATH, &credentials, RequestOptions::skip_auth())
            .await
            .map_err(|err| {
                tracing::warn!(%username, status = ?err.status(), "login failed: {err}");
                AuthError::from_api(err, "Login failed")
            })?;

        let (token, profile) = response.into_session();
        self.store.save(&token, &profile).await;

        tracing::info!(user_id = %profile.id, username = %profile.username, "logged in");
        Ok(profile)
    }

    /// Token and authenticated profile both present. No network access.
    pub async fn is_authenticated(&self) -> bool {
        self.store.is_authenticated().await
    }

    /// Stored profile snapshot. No network access.
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.store.load_profile().await
    }

    /// Current state as seen from local storage.
    pub async fn state(&self) -> SessionState {
        if !self.is_authenticated().await {
            return SessionState::Anonymous;
        }
        match self.current_user().await {
            Some(profile) => SessionState::Authenticated(profile),
            None => SessionState::Anonymous,
        }
    }

    /// Gate for operations that need a signed-in user.
    pub async fn require_user(&self) -> Result<UserProfile, AuthError> {
        match self.state().await {
            SessionState::Authenticated(profile) => Ok(profile),
            SessionState::Anonymous => Err(AuthError::new("authentication required")),
        }
    }

    /// Ask the server whether the stored token is still good.
    ///
    /// `false` means the session is invalid and should be cleared with
    /// [`AuthSession::logout`]. Without a stored token no request is made.
    pub async fn validate_token(&self) -> bool {
        if self.store.load_token().await.is_none() {
            return false;
        }

        match self
            .client
            .get::<IgnoredAny>(VALIDATE_PATH, RequestOptions::default())
            .await
        {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(status = ?err.status(), "token validation failed: {err}");
                false
            }
        }
    }

    /// Exchange the stored token for a new one; the profile is left as is.
    pub async fn refresh_token(&self) -> Result<String, AuthError> {
        let Some(current) = self.store.load_token().await else {
            return Err(AuthError::new("No token to refresh"));
        };

        let request = RefreshRequest { token: current };
        let response: RefreshResponse = self
            .client
            .post(REFRESH_PATH, &request, RequestOptions::default())
            .await
            .map_err(|err| {
                tracing::warn!(status = ?err.status(), "token refresh failed: {err}");
                AuthError::from_api(err, "Token refresh failed")
            })?;

        self.store.save_token(&response.token).await;
        tracing::debug!("token refreshed");
        Ok(response.token)
    }

    /// Drop the local session. No network effect; cannot fail.
    pub async fn logout(&self) {
        self.store.clear().await;
        tracing::info!("logged out");
    }

    /// Startup check: trust a complete local session, otherwise ask the server
    /// and clear whatever is left when the token is rejected.
    pub async fn restore(&self) -> SessionState {
        if let state @ SessionState::Authenticated(_) = self.state().await {
            return state;
        }

        if !self.validate_token().await {
            self.logout().await;
            return SessionState::Anonymous;
        }

        match self.current_user().await {
            Some(profile) => SessionState::Authenticated(profile),
            None => SessionState::Anonymous,
        }
    }
}
