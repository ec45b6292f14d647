use super::types::{ChatMessage, MessageId, MessageIdGenerator, SyncStatus};

/// Ordered chat history
///
/// Append-only apart from the in-place text update of a streaming reply,
/// the confirmation flip of an answered user message, and the removal of
/// an aborted streaming reply.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    ids: MessageIdGenerator,
}

impl Conversation {
    /// A conversation holding only the welcome message
    pub fn new() -> Self {
        let mut ids = MessageIdGenerator::new();
        let welcome = ChatMessage::welcome(ids.next_id());
        Self {
            messages: vec![welcome],
            ids,
        }
    }

    /// Rebuild from persisted history; an empty history falls back to the welcome message
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        if messages.is_empty() {
            return Self::new();
        }
        let mut ids = MessageIdGenerator::new();
        for message in &messages {
            ids.observe(message.id);
        }
        Self { messages, ids }
    }

    pub fn next_id(&mut self) -> MessageId {
        self.ids.next_id()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.ids.observe(message.id);
        self.messages.push(message);
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// The oldest user message still waiting for a reply
    pub fn oldest_pending(&self) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_pending()).count()
    }

    /// Flip a user message to confirmed. Returns false if it is gone.
    pub fn confirm(&mut self, id: MessageId) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.status = SyncStatus::Confirmed;
                true
            }
            None => false,
        }
    }

    /// Replace the text of a message. Returns true if the text changed.
    pub fn set_text(&mut self, id: MessageId, text: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.text != text => {
                message.text.clear();
                message.text.push_str(text);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: MessageId) -> Option<ChatMessage> {
        let pos = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(pos))
    }

    /// Drop everything and restore the welcome message
    pub fn reset(&mut self) {
        self.messages.clear();
        let welcome = ChatMessage::welcome(self.ids.next_id());
        self.messages.push(welcome);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
