//! Ordered delivery of user messages
//!
//! The queue owns the conversation. User messages enter as `Pending` and are
//! handed out one at a time, oldest first, while the network is reachable,
//! no error notice is outstanding and no quiz is running. A message only
//! becomes `Confirmed` once its reply has arrived; a failed exchange leaves
//! it pending so the next drain picks the same message up again.

use crate::messages::{ChatMessage, Conversation, MessageId};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// A message handed out for sending
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub message_id: MessageId,
    pub text: String,
    /// Correlates log lines of one exchange
    pub request_id: Uuid,
    /// Conversation generation the message belongs to
    pub epoch: u64,
}

/// Why a drain did not hand out a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainBlocked {
    NothingPending,
    InFlight,
    Offline,
    ErrorShown,
    QuizActive,
}

impl fmt::Display for DrainBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DrainBlocked::NothingPending => "nothing pending",
            DrainBlocked::InFlight => "a message is already in flight",
            DrainBlocked::Offline => "offline",
            DrainBlocked::ErrorShown => "waiting for recovery after an error",
            DrainBlocked::QuizActive => "quiz is active",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone)]
pub struct SyncQueue {
    conversation: Conversation,
    in_flight: Option<MessageId>,
    online: bool,
    error_blocked: bool,
    consecutive_failures: u32,
    epoch: u64,
}

impl SyncQueue {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            in_flight: None,
            online: true,
            error_blocked: false,
            consecutive_failures: 0,
            epoch: 0,
        }
    }

    /// Append a pending user message. Never blocks.
    pub fn enqueue(&mut self, text: impl Into<String>) -> MessageId {
        let id = self.conversation.next_id();
        self.conversation.push(ChatMessage::pending_user(id, text));
        id
    }

    /// Hand out the oldest pending message if every gate is open
    pub fn begin_drain(&mut self, quiz_active: bool) -> Result<Outgoing, DrainBlocked> {
        if self.in_flight.is_some() {
            return Err(DrainBlocked::InFlight);
        }
        if quiz_active {
            return Err(DrainBlocked::QuizActive);
        }
        if !self.online {
            return Err(DrainBlocked::Offline);
        }
        if self.error_blocked {
            return Err(DrainBlocked::ErrorShown);
        }

        let message = self
            .conversation
            .oldest_pending()
            .ok_or(DrainBlocked::NothingPending)?;

        let outgoing = Outgoing {
            message_id: message.id,
            text: message.text.clone(),
            request_id: Uuid::new_v4(),
            epoch: self.epoch,
        };
        self.in_flight = Some(outgoing.message_id);
        debug!(message_id = %outgoing.message_id, request_id = %outgoing.request_id, "Drain started");
        Ok(outgoing)
    }

    /// Whether `outgoing` still refers to the live conversation
    pub fn is_current(&self, outgoing: &Outgoing) -> bool {
        outgoing.epoch == self.epoch && self.in_flight == Some(outgoing.message_id)
    }

    /// Confirm the sent message. Returns false if the conversation was reset meanwhile.
    pub fn finish_success(&mut self, outgoing: &Outgoing) -> bool {
        if !self.is_current(outgoing) {
            return false;
        }
        self.in_flight = None;
        self.consecutive_failures = 0;
        self.conversation.confirm(outgoing.message_id)
    }

    /// Release the in-flight slot after a failure, leaving the message pending.
    /// Returns the number of consecutive failures.
    pub fn finish_failure(&mut self, outgoing: &Outgoing) -> u32 {
        if !self.is_current(outgoing) {
            return self.consecutive_failures;
        }
        self.in_flight = None;
        self.error_blocked = true;
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    /// Record a connectivity change. Returns true when the network came back.
    pub fn set_online(&mut self, online: bool) -> bool {
        let recovered = online && (!self.online || self.error_blocked);
        self.online = online;
        if online {
            self.error_blocked = false;
            self.consecutive_failures = 0;
        }
        recovered
    }

    /// Lift the error block without resetting the failure count
    pub fn clear_error(&mut self) {
        self.error_blocked = false;
    }

    /// Drop all history; an exchange still in flight is forgotten
    pub fn reset(&mut self) {
        self.conversation.reset();
        self.in_flight = None;
        self.error_blocked = false;
        self.consecutive_failures = 0;
        self.epoch += 1;
    }

    pub fn in_flight(&self) -> Option<MessageId> {
        self.in_flight
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn is_error_blocked(&self) -> bool {
        self.error_blocked
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }
}

impl Default for SyncQueue {
    fn default() -> Self {
        Self::new(Conversation::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::SyncStatus;

    fn status(queue: &SyncQueue, id: MessageId) -> SyncStatus {
        queue.conversation().get(id).unwrap().status
    }

    #[test]
    fn test_single_message_in_flight() {
        let mut queue = SyncQueue::default();
        let first = queue.enqueue("one");
        queue.enqueue("two");

        let outgoing = queue.begin_drain(false).unwrap();
        assert_eq!(outgoing.message_id, first);
        assert_eq!(queue.begin_drain(false), Err(DrainBlocked::InFlight));
    }

    #[test]
    fn test_fifo_confirmation_order() {
        let mut queue = SyncQueue::default();
        let ids: Vec<_> = ["a", "b", "c"].iter().map(|t| queue.enqueue(*t)).collect();

        let mut confirmed = Vec::new();
        while let Ok(outgoing) = queue.begin_drain(false) {
            assert!(queue.finish_success(&outgoing));
            confirmed.push(outgoing.message_id);
        }

        assert_eq!(confirmed, ids);
        assert_eq!(
            queue.begin_drain(false),
            Err(DrainBlocked::NothingPending)
        );
    }

    #[test]
    fn test_failure_keeps_message_pending_and_blocks() {
        let mut queue = SyncQueue::default();
        let id = queue.enqueue("hello");

        let outgoing = queue.begin_drain(false).unwrap();
        assert_eq!(queue.finish_failure(&outgoing), 1);
        assert_eq!(status(&queue, id), SyncStatus::Pending);
        assert_eq!(queue.begin_drain(false), Err(DrainBlocked::ErrorShown));

        assert!(queue.set_online(true));
        let retry = queue.begin_drain(false).unwrap();
        assert_eq!(retry.message_id, id);
        assert_ne!(retry.request_id, outgoing.request_id);
        assert_eq!(queue.conversation().pending_count(), 1);
    }

    #[test]
    fn test_gates() {
        let mut queue = SyncQueue::default();
        queue.enqueue("hello");

        assert_eq!(queue.begin_drain(true), Err(DrainBlocked::QuizActive));
        assert!(!queue.set_online(false));
        assert_eq!(queue.begin_drain(false), Err(DrainBlocked::Offline));
        assert!(queue.set_online(true));
        assert!(queue.begin_drain(false).is_ok());
    }

    #[test]
    fn test_reconnect_while_healthy_is_not_a_recovery() {
        let mut queue = SyncQueue::default();
        assert!(!queue.set_online(true));
    }

    #[test]
    fn test_reset_invalidates_in_flight_exchange() {
        let mut queue = SyncQueue::default();
        queue.enqueue("hello");
        let outgoing = queue.begin_drain(false).unwrap();

        queue.reset();
        assert!(!queue.finish_success(&outgoing));
        assert_eq!(queue.in_flight(), None);
        assert_eq!(queue.conversation().len(), 1);
    }
}
