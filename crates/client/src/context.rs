//! Dependency container handed to whatever front end drives the client.

use std::sync::Arc;

use crate::auth::AuthSession;
use crate::config::{ClientConfig, SessionStorage};
use crate::http::RequestClient;
use crate::session::SessionStore;
use crate::storage::{DetachedStorage, KeyValueStorage, MemoryStorage, SqliteStorage};
use crate::users::UsersClient;

/// Session store, request client, auth manager and users client sharing one
/// storage backend.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub session: SessionStore,
    pub requests: RequestClient,
    pub auth: AuthSession,
    pub users: UsersClient,
}

impl ClientContext {
    /// Build from configuration, opening the configured session storage.
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let storage = open_storage(&config.session);
        Self::with_storage(&config.api_url, storage)
    }

    /// Build around an explicit storage backend.
    pub fn with_storage(api_url: &str, storage: Arc<dyn KeyValueStorage>) -> anyhow::Result<Self> {
        let session = SessionStore::new(storage);
        let requests = RequestClient::new(api_url, session.clone())?;
        let auth = AuthSession::new(requests.clone(), session.clone());
        let users = UsersClient::new(requests.clone());

        Ok(Self {
            session,
            requests,
            auth,
            users,
        })
    }
}

fn open_storage(choice: &SessionStorage) -> Arc<dyn KeyValueStorage> {
    match choice {
        SessionStorage::Memory => Arc::new(MemoryStorage::new()),
        SessionStorage::Detached => Arc::new(DetachedStorage),
        SessionStorage::Sqlite(path) => Arc::new(SqliteStorage::new(path)),
        SessionStorage::Default => match SqliteStorage::open_default() {
            Ok(storage) => {
                tracing::debug!(path = ?storage.path(), "using default session storage");
                Arc::new(storage)
            }
            Err(err) => {
                tracing::warn!("no session storage available, sessions will not persist: {err:?}");
                Arc::new(DetachedStorage)
            }
        },
    }
}
