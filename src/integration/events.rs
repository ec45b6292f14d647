use crate::audio::AudioStatus;
use crate::messages::{ChatMessage, MessageId};
use crate::vocab::{Category, LearnedWord};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// A reply could not be fetched; the message stays queued
    Connection,
    /// Speech could not be synthesized or played
    Speech,
    Info,
}

/// Events emitted by the chat engine
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A message was appended to the conversation
    MessageAdded(ChatMessage),

    /// The text of a message changed (streaming or final cleanup)
    MessageUpdated { id: MessageId, text: String },

    /// A user message received its reply
    MessageConfirmed(MessageId),

    /// A partially streamed reply was discarded
    MessageRemoved(MessageId),

    /// Everything was cleared; the welcome message is all that remains
    ConversationCleared(ChatMessage),

    WordLearned(LearnedWord),

    CategoryChanged(Category),

    QuizStarted,

    QuizEnded,

    AudioStatusChanged(AudioStatus),

    ConnectivityChanged { online: bool },

    /// Transient, user-facing notice
    Notice { kind: NoticeKind, text: String },
}

/// Fan-out of engine events to any number of subscribers
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<ChatEvent>>>,
}

impl EventBus {
    pub fn subscribe(&self) -> Receiver<ChatEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Send to every live subscriber, dropping the ones that went away
    pub fn emit(&self, event: ChatEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn emit_all(&self, events: impl IntoIterator<Item = ChatEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subscriber_receives_events() {
        let bus = EventBus::default();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.emit(ChatEvent::QuizStarted);

        assert_eq!(first.try_recv().unwrap(), ChatEvent::QuizStarted);
        assert_eq!(second.try_recv().unwrap(), ChatEvent::QuizStarted);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::default();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.emit(ChatEvent::QuizEnded);
        assert_eq!(bus.subscribers.lock().len(), 1);
        assert_eq!(kept.try_recv().unwrap(), ChatEvent::QuizEnded);
    }
}
