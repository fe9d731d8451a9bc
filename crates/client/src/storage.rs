//! Client-side key/value storage backing the session store.
//!
//! Storage is best-effort: failures are logged and degrade to "absent" or
//! "did nothing" instead of surfacing to callers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use tokio::sync::Mutex;

/// String key/value surface (the analogue of browser `localStorage`).
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str);
    async fn remove(&self, key: &str);
}

#[async_trait]
impl<S> KeyValueStorage for Arc<S>
where
    S: KeyValueStorage + ?Sized,
{
    async fn get(&self, key: &str) -> Option<String> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) {
        (**self).remove(key).await
    }
}

/// In-memory storage for tests and sessions that must not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    async fn remove(&self, key: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(key);
        }
    }
}

/// Storage for environments without a client-side store: every read is absent
/// and every write is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedStorage;

#[async_trait]
impl KeyValueStorage for DetachedStorage {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: &str) {}

    async fn remove(&self, _key: &str) {}
}

/// SQLite-backed storage that survives process restarts.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    path: PathBuf,
    /// Opened on first use.
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteStorage {
    /// Storage at an explicit database file (created on first use).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Storage at `{app_data_dir}/userdesk/session.db`.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(session_db_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the pool, opening the database and creating the table if necessary.
    async fn get_pool(&self) -> anyhow::Result<SqlitePool> {
        let mut pool_guard = self.pool.lock().await;
        if let Some(pool) = pool_guard.as_ref() {
            return Ok(pool.clone());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session directory at {:?}", parent))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("failed to open session database at {:?}", self.path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_entries (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create session_entries table")?;

        *pool_guard = Some(pool.clone());
        Ok(pool)
    }

    async fn try_get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let pool = self.get_pool().await?;

        let row = sqlx::query(
            r#"
            SELECT value
            FROM session_entries
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&pool)
        .await
        .context("failed to read session entry")?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn try_set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO session_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&pool)
        .await
        .context("failed to upsert session entry")?;

        Ok(())
    }

    async fn try_remove(&self, key: &str) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;

        sqlx::query(
            r#"
            DELETE FROM session_entries
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .execute(&pool)
        .await
        .context("failed to delete session entry")?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for SqliteStorage {
    async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::error!("failed to read {key} from session storage: {err:?}");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.try_set(key, value).await {
            tracing::error!("failed to write {key} to session storage: {err:?}");
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(err) = self.try_remove(key).await {
            tracing::error!("failed to remove {key} from session storage: {err:?}");
        }
    }
}

/// Resolve the path to the SQLite session database:
/// `{app_data_dir}/userdesk/session.db`.
fn session_db_path() -> anyhow::Result<PathBuf> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    dir.push("userdesk");
    dir.push("session.db");
    Ok(dir)
}
