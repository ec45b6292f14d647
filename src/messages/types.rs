use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text of the built-in greeting shown on a fresh or reset conversation
pub const WELCOME_TEXT: &str = "Hello! I am Ahmad. I'm here to help you with English vocabulary or translate to Hausa. What can I help you with today?";

/// Time-derived message identifier (milliseconds since the epoch, bumped to stay unique)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out strictly increasing ids derived from the wall clock
#[derive(Debug, Clone, Default)]
pub struct MessageIdGenerator {
    last: i64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort after `id`
    pub fn observe(&mut self, id: MessageId) {
        self.last = self.last.max(id.0);
    }

    pub fn next_id(&mut self) -> MessageId {
        let now = Utc::now().timestamp_millis();
        self.last = now.max(self.last + 1);
        MessageId(self.last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Delivery state of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Waiting for a reply from the completion service
    Pending,
    /// A reply has been received
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub status: SyncStatus,
}

impl ChatMessage {
    /// A user message that still has to be sent
    pub fn pending_user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            status: SyncStatus::Pending,
        }
    }

    /// A user message that is handled locally and never sent (quiz answers)
    pub fn local_user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            status: SyncStatus::Confirmed,
        }
    }

    pub fn bot(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            text: text.into(),
            status: SyncStatus::Confirmed,
        }
    }

    pub fn welcome(id: MessageId) -> Self {
        Self::bot(id, WELCOME_TEXT)
    }

    pub fn is_pending(&self) -> bool {
        self.sender == Sender::User && self.status == SyncStatus::Pending
    }
}
