//! Persisted session: a bearer token plus the signed-in user's profile.

use std::sync::Arc;

use userdesk_core::UserProfile;

use crate::storage::{DetachedStorage, KeyValueStorage, MemoryStorage};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key holding the JSON-serialized [`UserProfile`].
pub const PROFILE_KEY: &str = "auth_user";

/// Token + profile persistence over a [`KeyValueStorage`].
///
/// Cheap to clone; clones share the same storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// A store with no backing storage: loads are absent, writes are dropped.
    pub fn detached() -> Self {
        Self::new(Arc::new(DetachedStorage))
    }

    /// Persist both halves of a session.
    pub async fn save(&self, token: &str, profile: &UserProfile) {
        let profile_json = match serde_json::to_string(profile) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!("failed to serialize user profile: {err}");
                return;
            }
        };

        self.storage.set(TOKEN_KEY, token).await;
        self.storage.set(PROFILE_KEY, &profile_json).await;
    }

    /// Replace the token only (refresh); the profile is left untouched.
    pub async fn save_token(&self, token: &str) {
        self.storage.set(TOKEN_KEY, token).await;
    }

    pub async fn load_token(&self) -> Option<String> {
        self.storage
            .get(TOKEN_KEY)
            .await
            .filter(|token| !token.is_empty())
    }

    pub async fn load_profile(&self) -> Option<UserProfile> {
        let raw = self
            .storage
            .get(PROFILE_KEY)
            .await
            .filter(|raw| !raw.is_empty())?;

        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::error!("error parsing stored user profile: {err}");
                None
            }
        }
    }

    /// Remove both entries. Idempotent.
    pub async fn clear(&self) {
        self.storage.remove(TOKEN_KEY).await;
        self.storage.remove(PROFILE_KEY).await;
    }

    /// Both entries present, and the profile marked authenticated.
    pub async fn is_authenticated(&self) -> bool {
        if self.load_token().await.is_none() {
            return false;
        }
        self.load_profile()
            .await
            .is_some_and(|profile| profile.is_authenticated)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
