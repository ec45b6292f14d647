//! Persistence of chat history and learned words

pub mod kv;
pub mod persistent;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use persistent::{PersistentStore, Snapshot, HISTORY_KEY, WORDS_KEY};
