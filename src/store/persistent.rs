//! Best-effort mirror of the conversation and the learned words
//!
//! Reads that fail or do not parse are logged and treated as absent. Writes
//! are debounced: every `schedule_save` replaces the pending snapshot and
//! restarts the timer, so a burst of changes costs one write.

use super::kv::KeyValueStore;
use crate::messages::ChatMessage;
use crate::vocab::LearnedWords;
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const HISTORY_KEY: &str = "ahmad.chat_history";
pub const WORDS_KEY: &str = "ahmad.learned_words";

/// What gets written on the next save
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub messages: Vec<ChatMessage>,
    pub words: LearnedWords,
}

#[derive(Default)]
struct Pending {
    snapshot: Option<Snapshot>,
    timer: Option<JoinHandle<()>>,
}

pub struct PersistentStore {
    backend: Arc<dyn KeyValueStore>,
    debounce: Duration,
    pending: Arc<Mutex<Pending>>,
}

impl PersistentStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, debounce: Duration) -> Self {
        Self {
            backend,
            debounce,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Saved history, or empty when absent or unreadable
    pub fn load_conversation(&self) -> Vec<ChatMessage> {
        self.load(HISTORY_KEY).unwrap_or_default()
    }

    /// Saved learned words, or empty when absent or unreadable
    pub fn load_words(&self) -> LearnedWords {
        let words: Option<LearnedWords> = self.load(WORDS_KEY);
        // Re-insert so a hand-edited file cannot smuggle in duplicates
        words
            .map(|w| LearnedWords::from_words(w.iter().cloned()))
            .unwrap_or_default()
    }

    fn load<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, "Failed to read persisted state: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "Ignoring unparsable persisted state: {}", e);
                None
            }
        }
    }

    /// Replace the pending snapshot and restart the debounce timer
    pub fn schedule_save(&self, snapshot: Snapshot) {
        let mut pending = self.pending.lock();
        pending.snapshot = Some(snapshot);
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.pending);
        let debounce = self.debounce;
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let snapshot = {
                let mut pending = shared.lock();
                pending.timer = None;
                pending.snapshot.take()
            };
            if let Some(snapshot) = snapshot {
                write_snapshot(backend.as_ref(), &snapshot);
            }
        }));
    }

    /// Write the pending snapshot now, if any
    pub fn flush(&self) {
        let snapshot = {
            let mut pending = self.pending.lock();
            if let Some(timer) = pending.timer.take() {
                timer.abort();
            }
            pending.snapshot.take()
        };
        if let Some(snapshot) = snapshot {
            write_snapshot(self.backend.as_ref(), &snapshot);
        }
    }

    /// Forget pending writes and remove both keys
    pub fn reset(&self) {
        {
            let mut pending = self.pending.lock();
            if let Some(timer) = pending.timer.take() {
                timer.abort();
            }
            pending.snapshot = None;
        }
        for key in [HISTORY_KEY, WORDS_KEY] {
            if let Err(e) = self.backend.remove(key) {
                warn!(key, "Failed to clear persisted state: {}", e);
            }
        }
        debug!("Persisted state cleared");
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().snapshot.is_some()
    }
}

impl Drop for PersistentStore {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.lock().timer.take() {
            timer.abort();
        }
    }
}

fn write_snapshot(backend: &dyn KeyValueStore, snapshot: &Snapshot) {
    if let Err(e) = try_write(backend, snapshot) {
        warn!("Failed to persist state: {}", e);
    } else {
        debug!(
            messages = snapshot.messages.len(),
            words = snapshot.words.len(),
            "State persisted"
        );
    }
}

fn try_write(backend: &dyn KeyValueStore, snapshot: &Snapshot) -> Result<()> {
    backend.set(HISTORY_KEY, &serde_json::to_string(&snapshot.messages)?)?;
    backend.set(WORDS_KEY, &serde_json::to_string(&snapshot.words)?)?;
    Ok(())
}
