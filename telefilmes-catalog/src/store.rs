//! SQLite-backed media catalog.
//!
//! Schema is created eagerly at open so errors surface early. Foreign keys
//! cascade: deleting a series drops its seasons, deleting a season drops its
//! episodes.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use telefilmes_client::Message;

use crate::CatalogError;
use crate::models::{Episode, Season, SeasonWithEpisodes, Series, SeriesWithSeasons};

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS series (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL,
        poster_url  TEXT,
        description TEXT,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS seasons (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        series_id     INTEGER NOT NULL REFERENCES series(id) ON DELETE CASCADE,
        name          TEXT    NOT NULL,
        season_number INTEGER NOT NULL,
        created_at    INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_seasons_series ON seasons(series_id);

    CREATE TABLE IF NOT EXISTS episodes (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        season_id      INTEGER NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
        episode_number INTEGER NOT NULL,
        title          TEXT    NOT NULL,
        file_ref       INTEGER NOT NULL,
        message_id     INTEGER NOT NULL,
        chat_id        INTEGER NOT NULL,
        thumbnail_url  TEXT,
        duration_secs  INTEGER NOT NULL DEFAULT 0,
        size_bytes     INTEGER NOT NULL DEFAULT 0,
        created_at     INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_episodes_season ON episodes(season_id);
";

/// The media catalog store.
///
/// One connection, used from one context at a time — callers that need
/// concurrent access should wrap it in their own synchronization.
pub struct MediaStore {
    conn: Connection,
}

impl MediaStore {
    /// Open (or create) the catalog at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// An in-memory catalog, used by tests.
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ── Series ─────────────────────────────────────────────────────────────

    pub fn list_series(&self) -> Result<Vec<Series>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, poster_url, description, created_at, updated_at
             FROM series ORDER BY name",
        )?;
        let rows = stmt.query_map([], series_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Insert and return the stored row (with its assigned id).
    pub fn insert_series(&self, series: &Series) -> Result<Series, CatalogError> {
        self.conn.execute(
            "INSERT INTO series (name, poster_url, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![series.name, series.poster_url, series.description,
                    series.created_at, series.updated_at],
        )?;
        let mut stored = series.clone();
        stored.id = self.conn.last_insert_rowid();
        tracing::debug!("inserted series #{} ({})", stored.id, stored.name);
        Ok(stored)
    }

    pub fn update_series(&self, series: &Series) -> Result<(), CatalogError> {
        self.conn.execute(
            "UPDATE series SET name = ?1, poster_url = ?2, description = ?3, updated_at = ?4
             WHERE id = ?5",
            params![series.name, series.poster_url, series.description,
                    chrono::Utc::now().timestamp_millis(), series.id],
        )?;
        Ok(())
    }

    pub fn delete_series(&self, series_id: i64) -> Result<(), CatalogError> {
        self.conn.execute("DELETE FROM series WHERE id = ?1", params![series_id])?;
        Ok(())
    }

    pub fn series_with_seasons(&self, series_id: i64) -> Result<Option<SeriesWithSeasons>, CatalogError> {
        let series = self.conn.query_row(
            "SELECT id, name, poster_url, description, created_at, updated_at
             FROM series WHERE id = ?1",
            params![series_id],
            series_from_row,
        ).optional()?;
        match series {
            Some(series) => {
                let seasons = self.seasons_by_series(series_id)?;
                Ok(Some(SeriesWithSeasons { series, seasons }))
            }
            None => Ok(None),
        }
    }

    // ── Seasons ────────────────────────────────────────────────────────────

    pub fn seasons_by_series(&self, series_id: i64) -> Result<Vec<Season>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, series_id, name, season_number, created_at
             FROM seasons WHERE series_id = ?1 ORDER BY season_number",
        )?;
        let rows = stmt.query_map(params![series_id], season_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Every season across every series, for the save-to-season picker.
    pub fn list_seasons(&self) -> Result<Vec<Season>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, series_id, name, season_number, created_at
             FROM seasons ORDER BY series_id, season_number",
        )?;
        let rows = stmt.query_map([], season_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn insert_season(&self, season: &Season) -> Result<Season, CatalogError> {
        self.conn.execute(
            "INSERT INTO seasons (series_id, name, season_number, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![season.series_id, season.name, season.season_number, season.created_at],
        )?;
        let mut stored = season.clone();
        stored.id = self.conn.last_insert_rowid();
        Ok(stored)
    }

    pub fn update_season(&self, season: &Season) -> Result<(), CatalogError> {
        self.conn.execute(
            "UPDATE seasons SET name = ?1, season_number = ?2 WHERE id = ?3",
            params![season.name, season.season_number, season.id],
        )?;
        Ok(())
    }

    pub fn delete_season(&self, season_id: i64) -> Result<(), CatalogError> {
        self.conn.execute("DELETE FROM seasons WHERE id = ?1", params![season_id])?;
        Ok(())
    }

    pub fn season_with_episodes(&self, season_id: i64) -> Result<Option<SeasonWithEpisodes>, CatalogError> {
        let season = self.conn.query_row(
            "SELECT id, series_id, name, season_number, created_at
             FROM seasons WHERE id = ?1",
            params![season_id],
            season_from_row,
        ).optional()?;
        match season {
            Some(season) => {
                let episodes = self.episodes_by_season(season_id)?;
                Ok(Some(SeasonWithEpisodes { season, episodes }))
            }
            None => Ok(None),
        }
    }

    // ── Episodes ───────────────────────────────────────────────────────────

    pub fn episodes_by_season(&self, season_id: i64) -> Result<Vec<Episode>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, season_id, episode_number, title, file_ref, message_id, chat_id,
                    thumbnail_url, duration_secs, size_bytes, created_at
             FROM episodes WHERE season_id = ?1 ORDER BY episode_number",
        )?;
        let rows = stmt.query_map(params![season_id], episode_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn insert_episode(&self, episode: &Episode) -> Result<Episode, CatalogError> {
        self.conn.execute(
            "INSERT INTO episodes (season_id, episode_number, title, file_ref, message_id,
                                   chat_id, thumbnail_url, duration_secs, size_bytes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![episode.season_id, episode.episode_number, episode.title, episode.file_ref,
                    episode.message_id, episode.chat_id, episode.thumbnail_url,
                    episode.duration_secs, episode.size_bytes, episode.created_at],
        )?;
        let mut stored = episode.clone();
        stored.id = self.conn.last_insert_rowid();
        tracing::debug!("inserted episode #{} ({})", stored.id, stored.title);
        Ok(stored)
    }

    pub fn update_episode(&self, episode: &Episode) -> Result<(), CatalogError> {
        self.conn.execute(
            "UPDATE episodes SET episode_number = ?1, title = ?2, thumbnail_url = ?3
             WHERE id = ?4",
            params![episode.episode_number, episode.title, episode.thumbnail_url, episode.id],
        )?;
        Ok(())
    }

    pub fn delete_episode(&self, episode_id: i64) -> Result<(), CatalogError> {
        self.conn.execute("DELETE FROM episodes WHERE id = ?1", params![episode_id])?;
        Ok(())
    }

    pub fn episode_count(&self, season_id: i64) -> Result<i64, CatalogError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM episodes WHERE season_id = ?1",
            params![season_id],
            |row| row.get(0),
        )?)
    }

    /// The number the next episode filed into this season should get.
    pub fn next_episode_number(&self, season_id: i64) -> Result<i32, CatalogError> {
        let max: Option<i32> = self.conn.query_row(
            "SELECT MAX(episode_number) FROM episodes WHERE season_id = ?1",
            params![season_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// File a video message into a season as its next episode.
    ///
    /// Copies the attachment fields out of the message; the remote file is
    /// referenced, never duplicated locally.
    pub fn save_video(&self, message: &Message, season_id: i64) -> Result<Episode, CatalogError> {
        let number = self.next_episode_number(season_id)?;
        let episode = Episode::from_message(message, season_id, number)
            .ok_or(CatalogError::NoVideo)?;
        self.insert_episode(&episode)
    }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn series_from_row(row: &Row<'_>) -> rusqlite::Result<Series> {
    Ok(Series {
        id:          row.get(0)?,
        name:        row.get(1)?,
        poster_url:  row.get(2)?,
        description: row.get(3)?,
        created_at:  row.get(4)?,
        updated_at:  row.get(5)?,
    })
}

fn season_from_row(row: &Row<'_>) -> rusqlite::Result<Season> {
    Ok(Season {
        id:            row.get(0)?,
        series_id:     row.get(1)?,
        name:          row.get(2)?,
        season_number: row.get(3)?,
        created_at:    row.get(4)?,
    })
}

fn episode_from_row(row: &Row<'_>) -> rusqlite::Result<Episode> {
    Ok(Episode {
        id:             row.get(0)?,
        season_id:      row.get(1)?,
        episode_number: row.get(2)?,
        title:          row.get(3)?,
        file_ref:       row.get(4)?,
        message_id:     row.get(5)?,
        chat_id:        row.get(6)?,
        thumbnail_url:  row.get(7)?,
        duration_secs:  row.get(8)?,
        size_bytes:     row.get(9)?,
        created_at:     row.get(10)?,
    })
}
