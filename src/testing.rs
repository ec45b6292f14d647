//! Scripted collaborators for tests

use crate::audio::{AudioData, AudioSink, CancelFlag, Playback, PlaybackControl};
use crate::llm::client::{CompletionClient, FragmentStream, SpeechSynthesizer};
use crate::store::KeyValueStore;
use crate::vocab::Category;
use crate::{AhmadError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// One scripted completion outcome
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Whole reply; streamed as a single fragment
    Reply(String),
    /// Streamed fragment by fragment; joined for `complete`
    Fragments(Vec<String>),
    /// Fragments with a pause before each one
    Paced(Vec<String>, Duration),
    /// The call itself fails
    Fail(String),
    /// The stream yields these fragments, then fails
    FailAfter(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCall {
    pub prompt: String,
    pub category: Category,
    pub known_words: Vec<String>,
    pub streaming: bool,
}

/// Completion client answering from a script; unscripted calls echo the prompt
#[derive(Default)]
pub struct FakeCompletion {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<CompletionCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: Scripted) -> &Self {
        self.script.lock().push_back(outcome);
        self
    }

    pub fn reply(&self, text: impl Into<String>) -> &Self {
        self.push(Scripted::Reply(text.into()))
    }

    pub fn fail(&self, reason: impl Into<String>) -> &Self {
        self.push(Scripted::Fail(reason.into()))
    }

    /// Block the next call until the returned notify fires
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.prompt.clone()).collect()
    }

    async fn next(
        &self,
        prompt: &str,
        category: Category,
        known_words: &[String],
        streaming: bool,
    ) -> Scripted {
        self.calls.lock().push(CompletionCall {
            prompt: prompt.to_string(),
            category,
            known_words: known_words.to_vec(),
            streaming,
        });
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Scripted::Reply(format!("Reply to: {prompt}")))
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(
        &self,
        prompt: &str,
        category: Category,
        known_words: &[String],
    ) -> Result<String> {
        match self.next(prompt, category, known_words, false).await {
            Scripted::Reply(text) => Ok(text),
            Scripted::Fragments(parts) | Scripted::Paced(parts, _) => Ok(parts.concat()),
            Scripted::Fail(reason) => Err(AhmadError::CompletionError(reason)),
            Scripted::FailAfter(_) => {
                Err(AhmadError::CompletionError("scripted failure".into()))
            }
        }
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        category: Category,
        known_words: &[String],
    ) -> Result<FragmentStream> {
        let (parts, pause, fail) = match self.next(prompt, category, known_words, true).await {
            Scripted::Reply(text) => (vec![text], None, false),
            Scripted::Fragments(parts) => (parts, None, false),
            Scripted::Paced(parts, pause) => (parts, Some(pause), false),
            Scripted::FailAfter(parts) => (parts, None, true),
            Scripted::Fail(reason) => return Err(AhmadError::CompletionError(reason)),
        };

        Ok(Box::pin(async_stream::stream! {
            for part in parts {
                if let Some(pause) = pause {
                    tokio::time::sleep(pause).await;
                }
                yield Ok(part);
            }
            if fail {
                yield Err(AhmadError::CompletionError("stream interrupted".into()));
            }
        }))
    }
}

/// Speech synthesizer returning a short burst of silence
#[derive(Default)]
pub struct FakeSynthesizer {
    requests: Mutex<Vec<String>>,
    fail_next: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Block the next synthesis until the returned notify fires
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<String> {
        self.requests.lock().push(text.to_string());
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AhmadError::SpeechError("scripted failure".into()));
        }
        // 10 ms of 24 kHz silence
        Ok(STANDARD.encode(vec![0u8; 480]))
    }
}

/// Sink whose playbacks only end when the test says so
#[derive(Default)]
pub struct ManualSink {
    flags: Mutex<Vec<CancelFlag>>,
    running: Mutex<Vec<PlaybackControl>>,
}

impl ManualSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// End every running playback
    pub fn finish_all(&self) {
        let running: Vec<_> = self.running.lock().drain(..).collect();
        for control in running {
            control.finish();
        }
    }

    pub fn started_count(&self) -> usize {
        self.flags.lock().len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.flags.lock().iter().filter(|f| f.is_cancelled()).count()
    }
}

impl AudioSink for ManualSink {
    fn play(&self, _audio: AudioData) -> Result<Playback> {
        let (playback, control) = Playback::channel();
        self.flags.lock().push(playback.cancel_flag());
        self.running.lock().push(control);
        Ok(playback)
    }
}

/// Store where every operation fails
#[derive(Debug, Default)]
pub struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Err(AhmadError::StorageError(format!("cannot read {key}")))
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(AhmadError::StorageError(format!("cannot write {key}")))
    }

    fn remove(&self, key: &str) -> Result<()> {
        Err(AhmadError::StorageError(format!("cannot remove {key}")))
    }
}
