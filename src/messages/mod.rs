pub mod storage;
pub mod types;

pub use storage::Conversation;
pub use types::{ChatMessage, MessageId, MessageIdGenerator, Sender, SyncStatus, WELCOME_TEXT};
