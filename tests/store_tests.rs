//! Persistence through the file-backed store

use ahmad::audio::NullSink;
use ahmad::integration::{AppConfig, ChatEngine, Collaborators};
use ahmad::messages::{ChatMessage, MessageId, SyncStatus, WELCOME_TEXT};
use ahmad::store::{FileStore, KeyValueStore, PersistentStore, Snapshot, HISTORY_KEY, WORDS_KEY};
use ahmad::sync::RetryPolicy;
use ahmad::testing::{FakeCompletion, FakeSynthesizer};
use ahmad::vocab::{LearnedWord, LearnedWords};
use std::sync::Arc;
use std::time::Duration;

fn engine(dir: &std::path::Path, completion: Arc<FakeCompletion>) -> ChatEngine {
    let config = AppConfig::new("test-key")
        .with_streaming(false)
        .with_auto_speak(false)
        .with_retry(RetryPolicy::reconnect_only())
        .with_data_dir(dir);
    ChatEngine::new(
        config,
        Collaborators {
            completion,
            synthesizer: Arc::new(FakeSynthesizer::new()),
            sink: Arc::new(NullSink),
            store: Arc::new(FileStore::new(dir).unwrap()),
        },
    )
}

#[tokio::test]
async fn test_conversation_round_trips_through_files() {
    let dir = tempfile::tempdir().unwrap();

    let completion = Arc::new(FakeCompletion::new());
    completion.reply("<WORD>dog</WORD>Dog\n**Hausa Translation:** Kare");
    let first = engine(dir.path(), completion);
    first.send("teach me").unwrap();
    first.settle().await;
    first.shutdown();

    assert!(dir.path().join(format!("{HISTORY_KEY}.json")).exists());
    assert!(dir.path().join(format!("{WORDS_KEY}.json")).exists());

    let second = engine(dir.path(), Arc::new(FakeCompletion::new()));
    let snapshot = second.snapshot();
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[0].text, WELCOME_TEXT);
    assert_eq!(snapshot.messages[1].status, SyncStatus::Confirmed);
    assert_eq!(snapshot.messages[2].text, "Dog\n**Hausa Translation:** Kare");
    assert!(snapshot.words.contains("dog"));
}

#[tokio::test]
async fn test_corrupt_files_fall_back_to_welcome() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(format!("{HISTORY_KEY}.json")), "[{\"id\":").unwrap();
    std::fs::write(dir.path().join(format!("{WORDS_KEY}.json")), "nope").unwrap();

    let engine = engine(dir.path(), Arc::new(FakeCompletion::new()));
    let snapshot = engine.snapshot();

    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].text, WELCOME_TEXT);
    assert!(snapshot.words.is_empty());
}

#[tokio::test]
async fn test_persisted_json_layout() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FileStore::new(dir.path()).unwrap());
    let store = PersistentStore::new(backend.clone(), Duration::from_millis(10));

    store.schedule_save(Snapshot {
        messages: vec![ChatMessage::pending_user(MessageId(5), "hello")],
        words: LearnedWords::from_words([LearnedWord::new("sun", "rana")]),
    });
    store.flush();

    let history: serde_json::Value =
        serde_json::from_str(&backend.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(history[0]["id"], 5);
    assert_eq!(history[0]["sender"], "user");
    assert_eq!(history[0]["status"], "pending");

    let words: serde_json::Value =
        serde_json::from_str(&backend.get(WORDS_KEY).unwrap().unwrap()).unwrap();
    assert!(words.is_array());
    assert_eq!(words.as_array().unwrap().len(), 1);
}
