//! Client configuration.

use std::path::PathBuf;

/// Environment variable holding the directory API base URL.
pub const API_URL_VAR: &str = "USERDESK_API_URL";
/// Environment variable selecting session storage: `memory`, `none`, or a file path.
pub const SESSION_VAR: &str = "USERDESK_SESSION";

/// Where the session (token + profile) is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStorage {
    /// SQLite file under the OS data directory; falls back to `Detached` when
    /// no data directory can be resolved.
    #[default]
    Default,
    /// Process-local; lost on exit.
    Memory,
    /// No client-side storage at all.
    Detached,
    /// SQLite file at an explicit path.
    Sqlite(PathBuf),
}

impl SessionStorage {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "default" => Self::Default,
            "memory" => Self::Memory,
            "none" | "detached" => Self::Detached,
            path => Self::Sqlite(PathBuf::from(path)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientConfig {
    /// Base URL of the directory API. Empty means relative request paths.
    pub api_url: String,
    pub session: SessionStorage,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            session: SessionStorage::Default,
        }
    }

    pub fn with_session(mut self, session: SessionStorage) -> Self {
        self.session = session;
        self
    }

    /// Read `USERDESK_API_URL` and `USERDESK_SESSION`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(API_URL_VAR).unwrap_or_else(|| {
            tracing::warn!("{API_URL_VAR} not set; requests will use relative paths");
            String::new()
        });

        let session = lookup(SESSION_VAR)
            .map(|v| SessionStorage::parse(&v))
            .unwrap_or_default();

        Self { api_url, session }
    }
}
