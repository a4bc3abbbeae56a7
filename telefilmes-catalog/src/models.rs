//! Catalog entities: series, their seasons, and the episodes filed into them.

use telefilmes_client::Message;

/// A tracked series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Row id; 0 until inserted.
    pub id:          i64,
    pub name:        String,
    pub poster_url:  Option<String>,
    pub description: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at:  i64,
    pub updated_at:  i64,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id:          0,
            name:        name.into(),
            poster_url:  None,
            description: None,
            created_at:  now,
            updated_at:  now,
        }
    }
}

/// One season of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Season {
    pub id:            i64,
    pub series_id:     i64,
    pub name:          String,
    pub season_number: i32,
    pub created_at:    i64,
}

impl Season {
    pub fn new(series_id: i64, name: impl Into<String>, season_number: i32) -> Self {
        Self {
            id: 0,
            series_id,
            name: name.into(),
            season_number,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// An episode, produced by filing a video message into a season.
///
/// The `file_ref`/`message_id`/`chat_id` triple points back at the remote
/// message the video came from; the catalog never stores the video itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub id:             i64,
    pub season_id:      i64,
    pub episode_number: i32,
    pub title:          String,
    pub file_ref:       i32,
    pub message_id:     i64,
    pub chat_id:        i64,
    pub thumbnail_url:  Option<String>,
    pub duration_secs:  i32,
    pub size_bytes:     i64,
    pub created_at:     i64,
}

impl Episode {
    /// Build an episode from a video message.
    ///
    /// Returns `None` if the message carries no video attachment. The title
    /// is the message text, falling back to "Episode N" when empty.
    pub fn from_message(message: &Message, season_id: i64, episode_number: i32) -> Option<Self> {
        let video = message.video?;
        let title = if message.text.is_empty() {
            format!("Episode {episode_number}")
        } else {
            message.text.clone()
        };
        Some(Self {
            id: 0,
            season_id,
            episode_number,
            title,
            file_ref:      video.file.0,
            message_id:    message.id,
            chat_id:       message.chat_id,
            thumbnail_url: None,
            duration_secs: video.duration_secs,
            size_bytes:    video.size_bytes,
            created_at:    chrono::Utc::now().timestamp_millis(),
        })
    }
}

/// A series together with its seasons.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesWithSeasons {
    pub series:  Series,
    pub seasons: Vec<Season>,
}

/// A season together with its episodes, ordered by episode number.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonWithEpisodes {
    pub season:   Season,
    pub episodes: Vec<Episode>,
}
