//! Accumulates the fragments of one streaming reply
//!
//! Fragments are appended without touching the conversation. A ticker task
//! publishes the buffer through the flush callback at a fixed interval, and
//! only when something new arrived, so a fast stream costs at most one
//! update per interval.

use crate::messages::MessageId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Receives snapshots of the buffer for the streaming message
pub type FlushFn = Arc<dyn Fn(MessageId, &str) + Send + Sync>;

#[derive(Default)]
struct Shared {
    text: String,
    dirty: bool,
    closed: bool,
}

struct ActiveStream {
    message_id: MessageId,
    shared: Arc<Mutex<Shared>>,
    ticker: JoinHandle<()>,
}

pub struct StreamBuffer {
    flush_interval: Duration,
    on_flush: FlushFn,
    active: Option<ActiveStream>,
}

impl StreamBuffer {
    pub fn new(flush_interval: Duration, on_flush: FlushFn) -> Self {
        Self {
            flush_interval,
            on_flush,
            active: None,
        }
    }

    /// Start accumulating for `message_id`.
    ///
    /// A stream that is still active is aborted first; its id is returned so
    /// the caller can discard that message.
    pub fn begin(&mut self, message_id: MessageId) -> Option<MessageId> {
        let superseded = self.abort();

        let shared = Arc::new(Mutex::new(Shared::default()));
        let ticker = tokio::spawn(run_ticker(
            message_id,
            Arc::clone(&shared),
            Arc::clone(&self.on_flush),
            self.flush_interval,
        ));

        debug!(%message_id, "Stream started");
        self.active = Some(ActiveStream {
            message_id,
            shared,
            ticker,
        });
        superseded
    }

    /// Add a fragment. Returns false when no stream is active.
    pub fn append(&self, fragment: &str) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        let mut shared = active.shared.lock();
        if fragment.is_empty() {
            return true;
        }
        shared.text.push_str(fragment);
        shared.dirty = true;
        true
    }

    /// Publish the complete text one last time, stop the ticker and return the text
    pub fn finalize(&mut self) -> Option<(MessageId, String)> {
        let active = self.active.take()?;
        let text = {
            let mut shared = active.shared.lock();
            shared.closed = true;
            if shared.dirty {
                shared.dirty = false;
                (self.on_flush)(active.message_id, &shared.text);
            }
            std::mem::take(&mut shared.text)
        };
        active.ticker.abort();
        debug!(message_id = %active.message_id, chars = text.len(), "Stream finalized");
        Some((active.message_id, text))
    }

    /// Stop the ticker and drop the buffer. Returns the id of the discarded message.
    pub fn abort(&mut self) -> Option<MessageId> {
        let active = self.active.take()?;
        active.shared.lock().closed = true;
        active.ticker.abort();
        debug!(message_id = %active.message_id, "Stream aborted");
        Some(active.message_id)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn message_id(&self) -> Option<MessageId> {
        self.active.as_ref().map(|a| a.message_id)
    }
}

impl Drop for StreamBuffer {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.ticker.abort();
        }
    }
}

async fn run_ticker(
    message_id: MessageId,
    shared: Arc<Mutex<Shared>>,
    on_flush: FlushFn,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        // Flushing under the lock keeps a late tick from publishing a stale
        // snapshot after finalize
        let mut state = shared.lock();
        if state.closed {
            break;
        }
        if state.dirty {
            state.dirty = false;
            on_flush(message_id, &state.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_buffer() -> (StreamBuffer, Arc<Mutex<Vec<(MessageId, String)>>>) {
        let flushed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&flushed);
        let on_flush: FlushFn = Arc::new(move |id, text: &str| {
            sink.lock().push((id, text.to_string()));
        });
        (
            StreamBuffer::new(Duration::from_millis(100), on_flush),
            flushed,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalize_returns_concatenation() {
        let (mut buffer, _) = recording_buffer();
        buffer.begin(MessageId(1));
        assert!(buffer.append("Hello"));
        assert!(buffer.append(" there"));

        let (id, text) = buffer.finalize().unwrap();
        assert_eq!(id, MessageId(1));
        assert_eq!(text, "Hello there");
        assert!(!buffer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalize_is_independent_of_flush_timing() {
        let (mut buffer, flushed) = recording_buffer();
        buffer.begin(MessageId(7));

        buffer.append("Hel");
        tokio::time::sleep(Duration::from_millis(150)).await;
        buffer.append("lo");
        buffer.append(" the");
        tokio::time::sleep(Duration::from_millis(250)).await;
        buffer.append("re");

        let (_, text) = buffer.finalize().unwrap();
        assert_eq!(text, "Hello there");

        let snapshots: Vec<String> = flushed.lock().iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(snapshots.first().map(String::as_str), Some("Hel"));
        assert_eq!(snapshots.last().map(String::as_str), Some("Hello there"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_only_flushes_changes() {
        let (mut buffer, flushed) = recording_buffer();
        buffer.begin(MessageId(2));
        buffer.append("Sannu");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(flushed.lock().len(), 1);

        buffer.finalize();
        // Nothing new since the last tick, so no extra flush
        assert_eq!(flushed.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_discards_and_stops_flushing() {
        let (mut buffer, flushed) = recording_buffer();
        buffer.begin(MessageId(3));
        buffer.append("partial");

        assert_eq!(buffer.abort(), Some(MessageId(3)));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(flushed.lock().is_empty());
        assert!(!buffer.append("late"));
        assert!(buffer.finalize().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_supersedes_active_stream() {
        let (mut buffer, _) = recording_buffer();
        assert_eq!(buffer.begin(MessageId(4)), None);
        buffer.append("old");
        assert_eq!(buffer.begin(MessageId(5)), Some(MessageId(4)));
        buffer.append("new");

        let (id, text) = buffer.finalize().unwrap();
        assert_eq!(id, MessageId(5));
        assert_eq!(text, "new");
    }
}
