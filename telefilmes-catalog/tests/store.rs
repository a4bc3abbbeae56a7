//! Catalog store tests against in-memory databases.

use telefilmes_catalog::models::{Season, Series};
use telefilmes_catalog::{CatalogError, MediaStore};
use telefilmes_client::{FileRef, Message, VideoAttachment};

fn store_with_season() -> (MediaStore, i64) {
    let store = MediaStore::open_in_memory().unwrap();
    let series = store.insert_series(&Series::new("Breaking Bad")).unwrap();
    let season = store.insert_season(&Season::new(series.id, "Season 5", 5)).unwrap();
    (store, season.id)
}

fn video_message(id: i64, text: &str) -> Message {
    Message {
        id,
        chat_id: 42,
        text: text.into(),
        date: 1_700_000_000,
        video: Some(VideoAttachment {
            file:          FileRef(id as i32),
            duration_secs: 2820,
            size_bytes:    700_000_000,
        }),
    }
}

#[test]
fn series_crud_round_trip() {
    let store = MediaStore::open_in_memory().unwrap();

    let mut series = store.insert_series(&Series::new("Dark")).unwrap();
    assert!(series.id > 0);
    assert_eq!(store.list_series().unwrap().len(), 1);

    series.description = Some("Time travel".into());
    store.update_series(&series).unwrap();
    let listed = &store.list_series().unwrap()[0];
    assert_eq!(listed.description.as_deref(), Some("Time travel"));

    store.delete_series(series.id).unwrap();
    assert!(store.list_series().unwrap().is_empty());
}

#[test]
fn series_are_listed_by_name() {
    let store = MediaStore::open_in_memory().unwrap();
    store.insert_series(&Series::new("Ozark")).unwrap();
    store.insert_series(&Series::new("Dark")).unwrap();
    let names: Vec<String> = store.list_series().unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["Dark", "Ozark"]);
}

#[test]
fn seasons_belong_to_their_series() {
    let store = MediaStore::open_in_memory().unwrap();
    let a = store.insert_series(&Series::new("A")).unwrap();
    let b = store.insert_series(&Series::new("B")).unwrap();
    store.insert_season(&Season::new(a.id, "S2", 2)).unwrap();
    store.insert_season(&Season::new(a.id, "S1", 1)).unwrap();
    store.insert_season(&Season::new(b.id, "S1", 1)).unwrap();

    let seasons = store.seasons_by_series(a.id).unwrap();
    assert_eq!(seasons.len(), 2);
    // Ordered by season number, not insertion order.
    assert_eq!(seasons[0].season_number, 1);

    let with_seasons = store.series_with_seasons(a.id).unwrap().unwrap();
    assert_eq!(with_seasons.series.name, "A");
    assert_eq!(with_seasons.seasons.len(), 2);
}

#[test]
fn deleting_a_series_cascades() {
    let (store, season_id) = store_with_season();
    store.save_video(&video_message(1, "E1"), season_id).unwrap();

    let series = store.list_series().unwrap();
    store.delete_series(series[0].id).unwrap();

    assert!(store.list_seasons().unwrap().is_empty());
    assert_eq!(store.episode_count(season_id).unwrap(), 0);
}

#[test]
fn save_video_numbers_episodes_sequentially() {
    let (store, season_id) = store_with_season();

    let first = store.save_video(&video_message(100, "Felina part 1"), season_id).unwrap();
    let second = store.save_video(&video_message(101, ""), season_id).unwrap();

    assert_eq!(first.episode_number, 1);
    assert_eq!(first.title, "Felina part 1");
    assert_eq!(second.episode_number, 2);
    assert_eq!(second.title, "Episode 2");
    assert_eq!(second.file_ref, 101);
    assert_eq!(second.chat_id, 42);

    let with_episodes = store.season_with_episodes(season_id).unwrap().unwrap();
    assert_eq!(with_episodes.episodes.len(), 2);
    assert_eq!(store.next_episode_number(season_id).unwrap(), 3);
}

#[test]
fn save_video_rejects_text_only_messages() {
    let (store, season_id) = store_with_season();
    let message = Message { id: 1, chat_id: 42, text: "hello".into(), date: 0, video: None };
    assert!(matches!(store.save_video(&message, season_id), Err(CatalogError::NoVideo)));
}

#[test]
fn episode_update_and_delete() {
    let (store, season_id) = store_with_season();
    let mut episode = store.save_video(&video_message(1, "E1"), season_id).unwrap();

    episode.title = "Renamed".into();
    store.update_episode(&episode).unwrap();
    let episodes = store.episodes_by_season(season_id).unwrap();
    assert_eq!(episodes[0].title, "Renamed");

    store.delete_episode(episode.id).unwrap();
    assert_eq!(store.episode_count(season_id).unwrap(), 0);
}

#[test]
fn sqlite_credentials_round_trip() {
    use telefilmes_catalog::{ApiCredentials, CredentialStore, SqliteCredentialStore};

    let dir = std::env::temp_dir().join(format!("telefilmes-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.sqlite");

    let store = SqliteCredentialStore::open(&path).unwrap();
    assert!(store.load().unwrap().is_none());

    let creds = ApiCredentials { api_id: 94575, api_hash: "a3406d".into() };
    store.save(&creds).unwrap();
    assert_eq!(store.load().unwrap(), Some(creds));

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());

    let _ = std::fs::remove_dir_all(&dir);
}
