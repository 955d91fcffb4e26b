use super::*;
use crate::store::SessionStore;
use serde_json::json;
use tempfile::tempdir;

use crate::message::{MessageKind, SignalingMessage};
use crate::timestamp::Timestamp;

fn sample_session(id: &str) -> Session {
    let mut session = Session::new(id, "host-1");
    let mut msg = SignalingMessage::new(MessageKind::Offer, id, "host-1", json!({"sdp": "v=0"}));
    msg.timestamp = Some(Timestamp::now());
    session.push_message(msg);
    session
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let dir = tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).expect("open store");

    let session = sample_session("abc123");
    store.create(&session).await.expect("create");

    let loaded = store.get("abc123").await.expect("get").expect("present");
    assert_eq!(loaded, session);
}

#[tokio::test]
async fn get_missing_session_is_none() {
    let dir = tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).expect("open store");

    let loaded = store.get("nope").await.expect("get");
    assert!(loaded.is_none());
}

#[tokio::test]
async fn save_replaces_the_whole_record() {
    let dir = tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).expect("open store");

    let mut session = sample_session("abc123");
    store.create(&session).await.expect("create");

    session.add_participant("viewer-1");
    store.save(&session).await.expect("save");

    let loaded = store.get("abc123").await.expect("get").expect("present");
    assert_eq!(loaded.participants.len(), 2);
    assert!(loaded.participants.contains("viewer-1"));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).expect("open store");

    store.create(&sample_session("abc123")).await.expect("create");
    store.delete("abc123").await.expect("first delete");
    store.delete("abc123").await.expect("second delete");

    assert!(!store.exists("abc123").await.expect("exists"));
}

#[tokio::test]
async fn exists_reflects_the_record_on_disk() {
    let dir = tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).expect("open store");

    assert!(!store.exists("abc123").await.expect("exists"));
    store.create(&sample_session("abc123")).await.expect("create");
    assert!(store.exists("abc123").await.expect("exists"));
}

#[tokio::test]
async fn list_all_skips_corrupt_records() {
    let dir = tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).expect("open store");

    store.create(&sample_session("abc123")).await.expect("create");
    store.create(&sample_session("def456")).await.expect("create");
    std::fs::write(dir.path().join("broken.json"), "{ not json").expect("write junk");
    std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write stray file");

    let mut ids: Vec<String> = store
        .list_all()
        .await
        .expect("list")
        .into_iter()
        .map(|s| s.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["abc123", "def456"]);
}

#[tokio::test]
async fn records_survive_reopening_the_store() {
    let dir = tempdir().expect("temp dir");
    {
        let store = LocalStore::open(dir.path()).expect("open store");
        store.create(&sample_session("abc123")).await.expect("create");
    }

    let reopened = LocalStore::open(dir.path()).expect("reopen store");
    let loaded = reopened.get("abc123").await.expect("get").expect("present");
    assert_eq!(loaded.id, "abc123");
}

#[tokio::test]
async fn writes_leave_no_temp_files_behind() {
    let dir = tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).expect("open store");

    store.create(&sample_session("abc123")).await.expect("create");
    store.save(&sample_session("abc123")).await.expect("save");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn open_fails_when_the_directory_cannot_be_created() {
    let dir = tempdir().expect("temp dir");
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, "not a directory").expect("write blocker");

    match LocalStore::open(&blocker) {
        Err(RelayError::StoreUnavailable { message }) => {
            assert!(message.contains("cannot create store directory"));
        }
        other => panic!("expected StoreUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn overlapping_joins_are_last_writer_wins() {
    let dir = tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).expect("open store");
    store.create(&Session::new("abc123", "host-1")).await.expect("create");

    let mut first = store.get("abc123").await.expect("get").expect("present");
    let mut second = store.get("abc123").await.expect("get").expect("present");
    first.add_participant("viewer-1");
    second.add_participant("viewer-2");
    store.save(&first).await.expect("save first");
    store.save(&second).await.expect("save second");

    // Whole-record saves do not merge: the earlier join is lost.
    let stored = store.get("abc123").await.expect("get").expect("present");
    assert!(stored.participants.contains("viewer-2"));
    assert!(!stored.participants.contains("viewer-1"));
}
