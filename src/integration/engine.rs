//! Chat engine connecting the sync queue, streaming buffer, quiz, audio and store
//!
//! All conversation state sits behind one mutex that is never held across an
//! `.await`. The streaming buffer has its own mutex; when both are needed the
//! buffer is locked first. Work that waits on the network runs in spawned
//! drain tasks, and results are applied only if the exchange still belongs to
//! the live conversation.

use super::config::{AppConfig, AudioOutput};
use super::events::{ChatEvent, EventBus, NoticeKind};
use crate::audio::{AudioController, AudioSink, AudioStatus};
use crate::llm::client::{CompletionClient, SpeechSynthesizer};
use crate::llm::directive::{process_reply, streaming_display};
use crate::llm::prompts::TEACH_ME_PROMPT;
use crate::messages::{ChatMessage, Conversation, MessageId};
use crate::quiz::{Question, QuizEngine, Score, StartOutcome};
use crate::store::{KeyValueStore, PersistentStore, Snapshot};
use crate::sync::{DrainBlocked, FlushFn, Outgoing, StreamBuffer, SyncQueue};
use crate::vocab::{Category, LearnedWords};
use crate::{AhmadError, Result};
use crossbeam_channel::Receiver;
use futures::StreamExt;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const QUIZ_INTRO: &str = "Quiz time! Let's see how many of your words you remember.";

/// External services the engine talks to
#[derive(Clone)]
pub struct Collaborators {
    pub completion: Arc<dyn CompletionClient>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sink: Arc<dyn AudioSink>,
    pub store: Arc<dyn KeyValueStore>,
}

/// Read-only view of the engine state
#[derive(Debug, Clone)]
pub struct ChatSnapshot {
    pub messages: Vec<ChatMessage>,
    pub words: LearnedWords,
    pub category: Category,
    pub quiz_active: bool,
    pub quiz_question: Option<Question>,
    pub score: Score,
    pub online: bool,
    pub error_blocked: bool,
    pub in_flight: Option<MessageId>,
    pub audio: AudioStatus,
}

impl ChatSnapshot {
    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }
}

struct State {
    queue: SyncQueue,
    words: LearnedWords,
    category: Category,
    quiz: QuizEngine,
    /// Bot message currently receiving streamed text
    streaming: Option<MessageId>,
    /// A drain task is running or about to
    drain_scheduled: bool,
    retry_timer: Option<JoinHandle<()>>,
    quiz_timer: Option<JoinHandle<()>>,
}

struct Inner {
    config: AppConfig,
    completion: Arc<dyn CompletionClient>,
    audio: AudioController,
    store: PersistentStore,
    events: Arc<EventBus>,
    state: Mutex<State>,
    stream: Mutex<StreamBuffer>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to the chat engine; cheap to clone
#[derive(Clone)]
pub struct ChatEngine {
    inner: Arc<Inner>,
}

impl ChatEngine {
    /// Build the engine from persisted state and start draining anything
    /// still pending. Must be called inside a tokio runtime.
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        Self::build(config, collaborators, QuizEngine::new)
    }

    /// Like `new`, with a fixed quiz question order
    pub fn with_quiz_rng(
        config: AppConfig,
        collaborators: Collaborators,
        rng: StdRng,
    ) -> Self {
        Self::build(config, collaborators, move |min_words| {
            QuizEngine::with_rng(min_words, rng)
        })
    }

    fn build(
        config: AppConfig,
        collaborators: Collaborators,
        quiz: impl FnOnce(usize) -> QuizEngine,
    ) -> Self {
        let store = PersistentStore::new(collaborators.store, config.store.debounce);
        let conversation = Conversation::from_messages(store.load_conversation());
        let words = store.load_words();
        info!(
            messages = conversation.len(),
            pending = conversation.pending_count(),
            words = words.len(),
            "Restored chat state"
        );

        let events = Arc::new(EventBus::default());
        let audio = {
            let events = Arc::clone(&events);
            AudioController::new(collaborators.synthesizer, collaborators.sink).with_listener(
                Arc::new(move |status: AudioStatus| {
                    events.emit(ChatEvent::AudioStatusChanged(status))
                }),
            )
        };

        let state = State {
            queue: SyncQueue::new(conversation),
            words,
            category: Category::default(),
            quiz: quiz(config.quiz.min_words),
            streaming: None,
            drain_scheduled: false,
            retry_timer: None,
            quiz_timer: None,
        };

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let on_flush: FlushFn = Arc::new(move |id: MessageId, text: &str| {
                if let Some(inner) = weak.upgrade() {
                    inner.apply_stream_snapshot(id, text);
                }
            });
            Inner {
                stream: Mutex::new(StreamBuffer::new(config.stream.flush_interval, on_flush)),
                completion: collaborators.completion,
                audio,
                store,
                events,
                state: Mutex::new(state),
                tasks: Mutex::new(Vec::new()),
                config,
            }
        });

        inner.trigger_drain();
        Self { inner }
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    /// Submit user text. Outside a quiz it is queued for sending; during a
    /// quiz it is graded locally. Blank input is ignored.
    pub fn send(&self, text: &str) -> Option<MessageId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.inner.state.lock().quiz.is_active() {
            Some(self.inner.answer_quiz(text))
        } else {
            Some(self.inner.enqueue(text))
        }
    }

    /// Ask the tutor for a new word from the current category
    pub fn teach_me(&self) -> Option<MessageId> {
        self.send(TEACH_ME_PROMPT)
    }

    /// Report a connectivity change; coming back online lifts the error block
    pub fn set_online(&self, online: bool) {
        self.inner.set_online(online);
    }

    /// Lift the error block and try the oldest pending message again
    pub fn retry(&self) {
        self.inner.recover("manual retry");
    }

    pub fn set_category(&self, category: Category) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.quiz.is_active() {
                return Err(AhmadError::QuizActive(
                    "category cannot change during a quiz".into(),
                ));
            }
            if state.category == category {
                return Ok(());
            }
            state.category = category;
        }
        info!(%category, "Category changed");
        self.inner.events.emit(ChatEvent::CategoryChanged(category));
        Ok(())
    }

    /// Enter quiz mode. Returns false (after posting guidance) when too few words are known.
    pub fn start_quiz(&self) -> bool {
        self.inner.start_quiz()
    }

    /// Leave quiz mode, optionally posting the final score
    pub fn end_quiz(&self, show_score: bool) {
        self.inner.end_quiz(show_score);
    }

    /// Speak a message, replacing anything playing
    pub async fn speak(&self, id: MessageId) -> Result<()> {
        let text = self.message_text(id)?;
        let result = self.inner.audio.speak(&text, id).await;
        self.inner.report_speech(&result);
        result
    }

    /// Stop the message if it is the one playing, otherwise speak it
    pub async fn toggle_speech(&self, id: MessageId) -> Result<()> {
        let text = self.message_text(id)?;
        let result = self.inner.audio.toggle(&text, id).await;
        self.inner.report_speech(&result);
        result
    }

    pub fn stop_audio(&self) {
        self.inner.audio.stop();
    }

    /// Clear the conversation and learned words, back to the welcome message
    pub fn reset(&self) {
        self.inner.reset();
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.inner.state.lock();
        ChatSnapshot {
            messages: state.queue.conversation().to_vec(),
            words: state.words.clone(),
            category: state.category,
            quiz_active: state.quiz.is_active(),
            quiz_question: state.quiz.current().cloned(),
            score: state.quiz.score(),
            online: state.queue.is_online(),
            error_blocked: state.queue.is_error_blocked(),
            in_flight: state.queue.in_flight(),
            audio: self.inner.audio.status(),
        }
    }

    /// Write pending state to the store now
    pub fn flush(&self) {
        self.inner.store.flush();
    }

    /// Wait for running drains and speech requests to finish
    pub async fn settle(&self) {
        loop {
            let tasks: Vec<_> = self.inner.tasks.lock().drain(..).collect();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    if e.is_panic() {
                        error!("Engine task panicked: {}", e);
                    }
                }
            }
        }
    }

    /// Stop timers and audio and write pending state
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            abort_timer(&mut state.retry_timer);
            abort_timer(&mut state.quiz_timer);
        }
        self.inner.stream.lock().abort();
        self.inner.audio.stop();
        self.inner.store.flush();
        info!("Chat engine shut down");
    }

    fn message_text(&self, id: MessageId) -> Result<String> {
        self.inner
            .state
            .lock()
            .queue
            .conversation()
            .get(id)
            .map(|m| m.text.clone())
            .ok_or_else(|| AhmadError::ConfigError(format!("no message with id {id}")))
    }
}

impl Inner {
    fn enqueue(self: &Arc<Self>, text: &str) -> MessageId {
        let (id, snapshot) = {
            let mut state = self.state.lock();
            let id = state.queue.enqueue(text);
            (id, persist_snapshot(&state))
        };
        debug!(message_id = %id, "Message queued");

        self.store.schedule_save(snapshot);
        self.events
            .emit(ChatEvent::MessageAdded(ChatMessage::pending_user(id, text)));
        self.trigger_drain();
        id
    }

    /// Make sure a drain task will look at the queue
    fn trigger_drain(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if state.drain_scheduled {
                return;
            }
            state.drain_scheduled = true;
        }
        let handle = tokio::spawn(Arc::clone(self).drain());
        self.track(handle);
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let (outgoing, category, known_words) = {
                let mut state = self.state.lock();
                let quiz_active = state.quiz.is_active();
                let next = state.queue.begin_drain(quiz_active);
                match next {
                    Ok(outgoing) => (outgoing, state.category, state.words.source_terms()),
                    // The task owning the exchange drains again once it completes
                    Err(DrainBlocked::InFlight) => return,
                    Err(reason) => {
                        state.drain_scheduled = false;
                        debug!(%reason, "Drain idle");
                        return;
                    }
                }
            };

            debug!(
                message_id = %outgoing.message_id,
                request_id = %outgoing.request_id,
                streaming = self.config.stream.enabled,
                "Sending message"
            );
            if self.config.stream.enabled {
                self.exchange_streaming(&outgoing, category, &known_words).await;
            } else {
                let reply = self
                    .completion
                    .complete(&outgoing.text, category, &known_words)
                    .await;
                match reply {
                    Ok(text) => self.complete_exchange(&outgoing, None, &text),
                    Err(e) => self.fail_exchange(&outgoing, None, e),
                }
            }
        }
    }

    async fn exchange_streaming(
        self: &Arc<Self>,
        outgoing: &Outgoing,
        category: Category,
        known_words: &[String],
    ) {
        let mut fragments = match self
            .completion
            .complete_stream(&outgoing.text, category, known_words)
            .await
        {
            Ok(fragments) => fragments,
            Err(e) => return self.fail_exchange(outgoing, None, e),
        };

        let Some(bot_id) = self.open_stream(outgoing) else {
            debug!(request_id = %outgoing.request_id, "Exchange outdated before streaming");
            return;
        };

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(fragment) => {
                    let buffer = self.stream.lock();
                    if buffer.message_id() != Some(bot_id) {
                        debug!(request_id = %outgoing.request_id, "Stream superseded");
                        return;
                    }
                    buffer.append(&fragment);
                }
                Err(e) => {
                    {
                        let mut buffer = self.stream.lock();
                        if buffer.message_id() == Some(bot_id) {
                            buffer.abort();
                        }
                    }
                    return self.fail_exchange(outgoing, Some(bot_id), e);
                }
            }
        }

        let finished = {
            let mut buffer = self.stream.lock();
            if buffer.message_id() == Some(bot_id) {
                buffer.finalize()
            } else {
                None
            }
        };
        match finished {
            Some((_, text)) if text.trim().is_empty() => {
                let err = AhmadError::CompletionError("empty response".into());
                self.fail_exchange(outgoing, Some(bot_id), err);
            }
            Some((_, text)) => self.complete_exchange(outgoing, Some(bot_id), &text),
            None => {}
        }
    }

    /// Add the empty bot message that receives the streamed text
    fn open_stream(&self, outgoing: &Outgoing) -> Option<MessageId> {
        let mut buffer = self.stream.lock();
        let (message, superseded) = {
            let mut state = self.state.lock();
            if !state.queue.is_current(outgoing) {
                return None;
            }
            let conversation = state.queue.conversation_mut();
            let id = conversation.next_id();
            let message = ChatMessage::bot(id, "");
            conversation.push(message.clone());
            let superseded = state.streaming.replace(id);
            (message, superseded)
        };

        // Only one stream at a time; a leftover one is discarded
        let aborted = buffer.begin(message.id);
        drop(buffer);
        let mut stale: Vec<MessageId> = aborted.into_iter().chain(superseded).collect();
        stale.dedup();
        for old in stale {
            if self.state.lock().queue.conversation_mut().remove(old).is_some() {
                self.events.emit(ChatEvent::MessageRemoved(old));
            }
        }

        let id = message.id;
        self.events.emit(ChatEvent::MessageAdded(message));
        Some(id)
    }

    /// Called by the stream ticker with the accumulated text
    fn apply_stream_snapshot(&self, id: MessageId, text: &str) {
        let visible = streaming_display(text);
        let changed = self
            .state
            .lock()
            .queue
            .conversation_mut()
            .set_text(id, visible);
        if changed {
            self.events.emit(ChatEvent::MessageUpdated {
                id,
                text: visible.to_string(),
            });
        }
    }

    fn complete_exchange(
        self: &Arc<Self>,
        outgoing: &Outgoing,
        bot_id: Option<MessageId>,
        raw: &str,
    ) {
        let reply = process_reply(raw);
        let mut events = Vec::new();

        let (reply_id, snapshot) = {
            let mut state = self.state.lock();
            if !state.queue.finish_success(outgoing) {
                debug!(request_id = %outgoing.request_id, "Reply for a cleared conversation dropped");
                return;
            }
            events.push(ChatEvent::MessageConfirmed(outgoing.message_id));

            let conversation = state.queue.conversation_mut();
            let reply_id = match bot_id {
                Some(id) => {
                    if conversation.set_text(id, &reply.display_text) {
                        events.push(ChatEvent::MessageUpdated {
                            id,
                            text: reply.display_text.clone(),
                        });
                    }
                    id
                }
                None => {
                    let id = conversation.next_id();
                    let message = ChatMessage::bot(id, reply.display_text.clone());
                    conversation.push(message.clone());
                    events.push(ChatEvent::MessageAdded(message));
                    id
                }
            };
            if state.streaming == bot_id {
                state.streaming = None;
            }

            if let Some(word) = reply.learned.clone() {
                if state.words.insert(word.clone()) {
                    info!(term = %word.source_term, "Learned a new word");
                    events.push(ChatEvent::WordLearned(word));
                } else {
                    debug!(term = %word.source_term, "Word already known");
                }
            }
            (reply_id, persist_snapshot(&state))
        };

        debug!(
            message_id = %outgoing.message_id,
            request_id = %outgoing.request_id,
            "Message confirmed"
        );
        self.store.schedule_save(snapshot);
        self.events.emit_all(events);

        if self.config.audio.auto_speak && self.config.audio.output != AudioOutput::Muted {
            self.speak_in_background(reply_id, reply.display_text);
        }
    }

    fn fail_exchange(
        self: &Arc<Self>,
        outgoing: &Outgoing,
        bot_id: Option<MessageId>,
        err: AhmadError,
    ) {
        let mut events = Vec::new();
        let retry_in = {
            let mut state = self.state.lock();
            if !state.queue.is_current(outgoing) {
                debug!(request_id = %outgoing.request_id, "Failure for a cleared conversation ignored");
                return;
            }
            let failures = state.queue.finish_failure(outgoing);
            if let Some(id) = bot_id {
                if state.queue.conversation_mut().remove(id).is_some() {
                    events.push(ChatEvent::MessageRemoved(id));
                }
                if state.streaming == Some(id) {
                    state.streaming = None;
                }
            }

            let retry_in = self.config.retry.delay_for(failures);
            abort_timer(&mut state.retry_timer);
            if let Some(delay) = retry_in {
                let weak = Arc::downgrade(self);
                state.retry_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.state.lock().retry_timer = None;
                        inner.recover("backoff elapsed");
                    }
                }));
            }
            warn!(
                message_id = %outgoing.message_id,
                request_id = %outgoing.request_id,
                failures,
                "Sending failed: {}",
                err
            );
            retry_in
        };

        match retry_in {
            Some(delay) => debug!(?delay, "Retry scheduled"),
            None => debug!("Waiting for reconnect before retrying"),
        }
        events.push(ChatEvent::Notice {
            kind: NoticeKind::Connection,
            text: err.user_message(),
        });
        self.events.emit_all(events);
    }

    /// Clear the error block and drain again
    fn recover(self: &Arc<Self>, reason: &str) {
        {
            let mut state = self.state.lock();
            abort_timer(&mut state.retry_timer);
            state.queue.clear_error();
        }
        debug!(reason, "Recovering send queue");
        self.trigger_drain();
    }

    fn set_online(self: &Arc<Self>, online: bool) {
        let (changed, recovered) = {
            let mut state = self.state.lock();
            let changed = state.queue.is_online() != online;
            let recovered = state.queue.set_online(online);
            if online {
                abort_timer(&mut state.retry_timer);
            }
            (changed, recovered)
        };
        if changed {
            info!(online, "Connectivity changed");
            self.events.emit(ChatEvent::ConnectivityChanged { online });
        }
        if recovered {
            self.trigger_drain();
        }
    }

    fn start_quiz(self: &Arc<Self>) -> bool {
        let mut events = Vec::new();
        let (started, snapshot) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            if state.quiz.is_active() {
                return true;
            }
            let outcome = state.quiz.start(&state.words);
            let conversation = state.queue.conversation_mut();
            let started = match outcome {
                StartOutcome::NeedMoreWords { guidance } => {
                    let message = ChatMessage::bot(conversation.next_id(), guidance);
                    conversation.push(message.clone());
                    events.push(ChatEvent::MessageAdded(message));
                    false
                }
                StartOutcome::Started(question) => {
                    let text = format!("{}\n\n{}", QUIZ_INTRO, question.prompt());
                    let message = ChatMessage::bot(conversation.next_id(), text);
                    conversation.push(message.clone());
                    events.push(ChatEvent::QuizStarted);
                    if state.category != Category::default() {
                        state.category = Category::default();
                        events.push(ChatEvent::CategoryChanged(state.category));
                    }
                    events.push(ChatEvent::MessageAdded(message));
                    true
                }
            };
            (started, persist_snapshot(state))
        };

        if started {
            info!("Quiz started");
        }
        self.store.schedule_save(snapshot);
        self.events.emit_all(events);
        started
    }

    fn answer_quiz(self: &Arc<Self>, text: &str) -> MessageId {
        let mut events = Vec::new();
        let (answer_id, snapshot) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let conversation = state.queue.conversation_mut();
            let answer = ChatMessage::local_user(conversation.next_id(), text);
            let answer_id = answer.id;
            conversation.push(answer.clone());
            events.push(ChatEvent::MessageAdded(answer));

            match state.quiz.answer(text) {
                Some(feedback) => {
                    let message = ChatMessage::bot(conversation.next_id(), feedback.text);
                    conversation.push(message.clone());
                    events.push(ChatEvent::MessageAdded(message));
                    self.schedule_question(state);
                }
                None => debug!("Answer received between questions"),
            }
            (answer_id, persist_snapshot(state))
        };

        self.store.schedule_save(snapshot);
        self.events.emit_all(events);
        answer_id
    }

    fn schedule_question(self: &Arc<Self>, state: &mut State) {
        abort_timer(&mut state.quiz_timer);
        let delay = self.config.quiz.feedback_delay;
        let weak = Arc::downgrade(self);
        state.quiz_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.ask_next_question();
            }
        }));
    }

    fn ask_next_question(self: &Arc<Self>) {
        let mut events = Vec::new();
        let snapshot = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.quiz_timer = None;
            if !state.quiz.is_active() {
                return;
            }
            match state.quiz.ask_next(&state.words) {
                Some(question) => {
                    let conversation = state.queue.conversation_mut();
                    let message = ChatMessage::bot(conversation.next_id(), question.prompt());
                    conversation.push(message.clone());
                    events.push(ChatEvent::MessageAdded(message));
                }
                None => events.push(ChatEvent::QuizEnded),
            }
            persist_snapshot(state)
        };
        self.store.schedule_save(snapshot);
        let ended = events.contains(&ChatEvent::QuizEnded);
        self.events.emit_all(events);
        if ended {
            self.trigger_drain();
        }
    }

    fn end_quiz(self: &Arc<Self>, show_score: bool) {
        let mut events = Vec::new();
        let snapshot = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            if !state.quiz.is_active() {
                return;
            }
            abort_timer(&mut state.quiz_timer);
            if let Some(summary) = state.quiz.end(show_score) {
                let conversation = state.queue.conversation_mut();
                let message = ChatMessage::bot(conversation.next_id(), summary);
                conversation.push(message.clone());
                events.push(ChatEvent::MessageAdded(message));
            }
            events.push(ChatEvent::QuizEnded);
            persist_snapshot(state)
        };
        info!("Quiz ended");
        self.store.schedule_save(snapshot);
        self.events.emit_all(events);
        self.trigger_drain();
    }

    fn reset(self: &Arc<Self>) {
        self.stream.lock().abort();
        let (welcome, quiz_was_active) = {
            let mut state = self.state.lock();
            abort_timer(&mut state.retry_timer);
            abort_timer(&mut state.quiz_timer);
            let quiz_was_active = state.quiz.is_active();
            state.quiz.end(false);
            state.queue.reset();
            state.words.clear();
            state.streaming = None;
            // A drain still waiting on the old exchange must not hold up new messages
            state.drain_scheduled = false;
            let welcome = state.queue.conversation().messages().first().cloned();
            (welcome, quiz_was_active)
        };
        self.audio.stop();
        self.store.reset();
        info!("Conversation cleared");

        if quiz_was_active {
            self.events.emit(ChatEvent::QuizEnded);
        }
        if let Some(welcome) = welcome {
            self.events.emit(ChatEvent::ConversationCleared(welcome));
        }
    }

    fn speak_in_background(self: &Arc<Self>, id: MessageId, text: String) {
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let result = inner.audio.speak(&text, id).await;
            inner.report_speech(&result);
        });
        self.track(handle);
    }

    fn report_speech(&self, result: &Result<()>) {
        if let Err(e) = result {
            self.events.emit(ChatEvent::Notice {
                kind: NoticeKind::Speech,
                text: e.user_message(),
            });
        }
    }
}

/// What gets persisted: everything except a reply that is still streaming
fn persist_snapshot(state: &State) -> Snapshot {
    let messages = state
        .queue
        .conversation()
        .messages()
        .iter()
        .filter(|m| Some(m.id) != state.streaming)
        .cloned()
        .collect();
    Snapshot {
        messages,
        words: state.words.clone(),
    }
}

fn abort_timer(timer: &mut Option<JoinHandle<()>>) {
    if let Some(timer) = timer.take() {
        timer.abort();
    }
}
