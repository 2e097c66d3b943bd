use chrono::{Duration, Utc};
use notula::modules::meeting::crud::MeetingStore;
use notula::modules::meeting::model::{MeetingNote, MeetingStatus, TranscriptSegment};
use tempfile::TempDir;

fn setup_store() -> (MeetingStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = MeetingStore::new(dir.path());
    (store, dir)
}

#[tokio::test]
async fn test_round_trip_equality() {
    let (store, _dir) = setup_store();

    let mut meeting = MeetingNote::new("https://meet.example/abc".to_string(), Some("bot-1".to_string()));
    meeting.participants = vec!["Ada Lovelace".to_string()];
    meeting.transcript = Some(vec![TranscriptSegment {
        speaker_name: Some("Ada Lovelace".to_string()),
        speaker_id: Some("1".to_string()),
        text: "Hello there".to_string(),
        start_seconds: Some(2.0),
        end_seconds: Some(3.5),
    }]);
    meeting.duration = Some("48 min".to_string());
    store.create(&meeting).await.unwrap();

    let stored = store.find_by_id(&meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.id, meeting.id);
    assert_eq!(stored.status, meeting.status);
    assert_eq!(stored.meeting_url, meeting.meeting_url);
    assert_eq!(stored.bot_id, meeting.bot_id);
    assert_eq!(stored.title, meeting.title);
    assert_eq!(stored.participants, meeting.participants);
    assert_eq!(stored.transcript, meeting.transcript);
    assert_eq!(stored.summary, meeting.summary);
    assert_eq!(stored.duration, meeting.duration);
    assert_eq!(stored.created_at, meeting.created_at);
    assert_eq!(stored.updated_at, meeting.updated_at);
}

#[tokio::test]
async fn test_find_by_id_missing_returns_none() {
    let (store, _dir) = setup_store();

    let found = store.find_by_id("5d2b8c1e-31f0-4ba8-a247-54c8e1f0a111").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_update_preserves_id_and_created_at() {
    let (store, _dir) = setup_store();

    let meeting = MeetingNote::new("https://meet.example/abc".to_string(), None);
    store.create(&meeting).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let updated = store
        .update(&meeting.id, |m| {
            m.id = "hijacked".to_string();
            m.created_at = Utc::now() - Duration::days(30);
            m.title = "Renamed".to_string();
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.id, meeting.id);
    assert_eq!(updated.created_at, meeting.created_at);
    assert_eq!(updated.title, "Renamed");
    assert!(updated.updated_at > meeting.updated_at);
    assert!(updated.updated_at >= updated.created_at);

    let stored = store.find_by_id(&meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.created_at, meeting.created_at);
}

#[tokio::test]
async fn test_update_missing_returns_none() {
    let (store, _dir) = setup_store();

    let updated = store
        .update("5d2b8c1e-31f0-4ba8-a247-54c8e1f0a111", |m| {
            m.title = "Renamed".to_string();
        })
        .await
        .unwrap();

    assert!(updated.is_none());
}

#[tokio::test]
async fn test_find_by_bot_id() {
    let (store, _dir) = setup_store();

    let with_bot = MeetingNote::new("https://meet.example/abc".to_string(), Some("bot-1".to_string()));
    store.create(&with_bot).await.unwrap();

    let without_bot = MeetingNote::new("https://meet.example/def".to_string(), None);
    store.create(&without_bot).await.unwrap();

    let found = store.find_by_bot_id("bot-1").await.unwrap().unwrap();
    assert_eq!(found.id, with_bot.id);

    assert!(store.find_by_bot_id("bot-2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_status_advance_is_persisted() {
    let (store, _dir) = setup_store();

    let meeting = MeetingNote::new("https://meet.example/abc".to_string(), Some("bot-1".to_string()));
    store.create(&meeting).await.unwrap();

    store
        .update(&meeting.id, |m| {
            m.advance(MeetingStatus::Processing);
        })
        .await
        .unwrap();

    let stored = store.find_by_id(&meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MeetingStatus::Processing);

    // A regression attempt must not stick.
    store
        .update(&meeting.id, |m| {
            m.advance(MeetingStatus::InProgress);
        })
        .await
        .unwrap();

    let stored = store.find_by_id(&meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MeetingStatus::Processing);
}

#[tokio::test]
async fn test_find_all_skips_unparseable_files() {
    let (store, dir) = setup_store();

    let meeting = MeetingNote::new("https://meet.example/abc".to_string(), None);
    store.create(&meeting).await.unwrap();

    tokio::fs::write(dir.path().join("broken.json"), b"not json")
        .await
        .unwrap();

    let meetings = store.find_all().await.unwrap();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0].id, meeting.id);
}

#[tokio::test]
async fn test_count() {
    let (store, _dir) = setup_store();

    assert_eq!(store.count().await.unwrap(), 0);

    store
        .create(&MeetingNote::new("https://meet.example/abc".to_string(), None))
        .await
        .unwrap();
    store
        .create(&MeetingNote::new("https://meet.example/def".to_string(), None))
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
}
