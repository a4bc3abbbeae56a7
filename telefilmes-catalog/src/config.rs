//! Persisted API credentials.
//!
//! The [`CredentialStore`] trait abstracts over where the messaging-service
//! credentials live, so callers can swap in SQLite, an in-memory store for
//! tests, or anything else. Credentials are read once, when the adapter is
//! initialized — changing them requires recreating the adapter, there is no
//! live-reload contract.

use std::path::PathBuf;

use rusqlite::{Connection, OptionalExtension, params};

use crate::CatalogError;

/// Application credentials for the messaging service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_id:   i32,
    pub api_hash: String,
}

// ─── Trait ────────────────────────────────────────────────────────────────────

/// An abstraction over where and how credentials are persisted.
pub trait CredentialStore: Send + Sync {
    /// Load saved credentials, or `None` if the user never configured any.
    fn load(&self) -> Result<Option<ApiCredentials>, CatalogError>;

    /// Persist the given credentials.
    fn save(&self, credentials: &ApiCredentials) -> Result<(), CatalogError>;

    /// Remove stored credentials.
    fn clear(&self) -> Result<(), CatalogError>;

    /// Human-readable name of this store (for log messages).
    fn name(&self) -> &str;
}

// ─── SqliteCredentialStore ───────────────────────────────────────────────────

/// SQLite-backed credential store — a single key/value `config` table.
pub struct SqliteCredentialStore {
    path: PathBuf,
}

impl SqliteCredentialStore {
    /// Open the store, creating the schema immediately so errors surface early.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { path })
    }

    fn conn(&self) -> Result<Connection, CatalogError> {
        Ok(Connection::open(&self.path)?)
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn load(&self) -> Result<Option<ApiCredentials>, CatalogError> {
        let conn = self.conn()?;
        let api_id: Option<String> = conn
            .query_row("SELECT value FROM config WHERE key = 'api_id'", [], |row| row.get(0))
            .optional()?;
        let api_hash: Option<String> = conn
            .query_row("SELECT value FROM config WHERE key = 'api_hash'", [], |row| row.get(0))
            .optional()?;
        match (api_id, api_hash) {
            (Some(id), Some(hash)) => {
                let api_id = id.parse::<i32>().map_err(|_| CatalogError::Corrupt("api_id"))?;
                Ok(Some(ApiCredentials { api_id, api_hash: hash }))
            }
            _ => Ok(None),
        }
    }

    fn save(&self, credentials: &ApiCredentials) -> Result<(), CatalogError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES ('api_id', ?1)",
            params![credentials.api_id.to_string()],
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES ('api_hash', ?1)",
            params![credentials.api_hash],
        )?;
        tracing::info!("credentials saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), CatalogError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM config WHERE key IN ('api_id', 'api_hash')", [])?;
        Ok(())
    }

    fn name(&self) -> &str { "sqlite" }
}

// ─── InMemoryCredentialStore ─────────────────────────────────────────────────

/// An ephemeral store that persists nothing. Useful for tests.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    data: std::sync::Mutex<Option<ApiCredentials>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<Option<ApiCredentials>, CatalogError> {
        Ok(self.data.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, credentials: &ApiCredentials) -> Result<(), CatalogError> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CatalogError> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    fn name(&self) -> &str { "in-memory" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let store = InMemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());

        let creds = ApiCredentials { api_id: 94575, api_hash: "abc".into() };
        store.save(&creds).unwrap();
        assert_eq!(store.load().unwrap(), Some(creds));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
