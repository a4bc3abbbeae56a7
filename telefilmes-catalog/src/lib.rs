//! # telefilmes-catalog
//!
//! The local media catalog: series, their seasons, and the episodes filed
//! into them from remote video messages, stored in SQLite. Also holds the
//! persisted messaging-service credentials.

#![deny(unsafe_code)]

pub mod config;
pub mod models;
pub mod store;

pub use config::{ApiCredentials, CredentialStore, InMemoryCredentialStore, SqliteCredentialStore};
pub use models::{Episode, Season, SeasonWithEpisodes, Series, SeriesWithSeasons};
pub use store::MediaStore;

use std::fmt;

// ─── CatalogError ────────────────────────────────────────────────────────────

/// The error type for every catalog operation.
#[derive(Debug)]
pub enum CatalogError {
    /// Underlying SQLite failure.
    Sqlite(rusqlite::Error),
    /// Tried to file a message that carries no video attachment.
    NoVideo,
    /// A stored value could not be interpreted (names the offending field).
    Corrupt(&'static str),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e)  => write!(f, "sqlite error: {e}"),
            Self::NoVideo    => write!(f, "message has no video attachment"),
            Self::Corrupt(w) => write!(f, "corrupt stored value: {w}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self { Self::Sqlite(e) }
}
