//! One-utterance-at-a-time speech playback
//!
//! State machine: `Idle` → `Loading(id)` while speech is synthesized →
//! `Speaking(id)` until the sink reports the end → `Idle`. Every new request
//! and every stop bumps a generation counter, so a synthesis result or an
//! end-of-playback signal belonging to an older request is ignored.

use super::pcm::decode_base64_pcm;
use super::sink::{AudioSink, CancelFlag};
use crate::llm::client::SpeechSynthesizer;
use crate::llm::directive::speech_text;
use crate::messages::MessageId;
use crate::{AhmadError, Result};
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioStatus {
    #[default]
    Idle,
    /// Speech for the message is being synthesized
    Loading(MessageId),
    /// Speech for the message is playing
    Speaking(MessageId),
}

impl AudioStatus {
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            AudioStatus::Idle => None,
            AudioStatus::Loading(id) | AudioStatus::Speaking(id) => Some(*id),
        }
    }

    pub fn is_loading(&self, id: MessageId) -> bool {
        *self == AudioStatus::Loading(id)
    }

    pub fn is_speaking(&self, id: MessageId) -> bool {
        *self == AudioStatus::Speaking(id)
    }
}

/// Called on every status change
pub type StatusListener = Arc<dyn Fn(AudioStatus) + Send + Sync>;

#[derive(Default)]
struct Inner {
    status: AudioStatus,
    generation: u64,
    cancel: Option<CancelFlag>,
}

#[derive(Clone)]
pub struct AudioController {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    inner: Arc<Mutex<Inner>>,
    /// Last status handed to the listener. Reentrant so a listener may call
    /// back into the controller.
    published: Arc<ReentrantMutex<Cell<AudioStatus>>>,
    listener: Option<StatusListener>,
}

impl AudioController {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            synthesizer,
            sink,
            inner: Arc::new(Mutex::new(Inner::default())),
            published: Arc::new(ReentrantMutex::new(Cell::new(AudioStatus::Idle))),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: StatusListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn status(&self) -> AudioStatus {
        self.inner.lock().status
    }

    /// Synthesize and play `text` for `message_id`, replacing anything playing.
    ///
    /// Returns once playback has started. Errors are only reported for the
    /// request that is still current; a request superseded while loading
    /// resolves quietly.
    pub async fn speak(&self, text: &str, message_id: MessageId) -> Result<()> {
        let generation = {
            let mut inner = self.inner.lock();
            cancel_playback(&mut inner);
            inner.generation += 1;
            inner.status = AudioStatus::Loading(message_id);
            inner.generation
        };
        self.publish();
        debug!(%message_id, "Requesting speech");

        let decoded = match self.synthesizer.synthesize(&speech_text(text)).await {
            Ok(encoded) => decode_base64_pcm(&encoded),
            Err(e) => Err(e),
        };
        let audio = match decoded {
            Ok(audio) => audio,
            Err(e) => return self.fail(generation, message_id, e),
        };

        if !self.is_current(generation) {
            debug!(%message_id, "Speech request superseded");
            return Ok(());
        }

        // Played without the lock held; the generation is checked again after
        let playback = match self.sink.play(audio) {
            Ok(playback) => playback,
            Err(e) => return self.fail(generation, message_id, e),
        };

        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!(%message_id, "Speech request superseded");
                playback.cancel_flag().cancel();
                return Ok(());
            }
            inner.cancel = Some(playback.cancel_flag());
            inner.status = AudioStatus::Speaking(message_id);
        }
        self.publish();

        let controller = self.clone();
        tokio::spawn(async move {
            playback.wait().await;
            controller.finish(generation);
        });

        Ok(())
    }

    /// Cancel loading and playback; safe to call when idle
    pub fn stop(&self) {
        let changed = {
            let mut inner = self.inner.lock();
            cancel_playback(&mut inner);
            inner.generation += 1;
            let changed = inner.status != AudioStatus::Idle;
            inner.status = AudioStatus::Idle;
            changed
        };
        if changed {
            debug!("Audio stopped");
        }
        self.publish();
    }

    /// Stop `message_id` if it is the active one, otherwise speak it
    pub async fn toggle(&self, text: &str, message_id: MessageId) -> Result<()> {
        if self.status().message_id() == Some(message_id) {
            self.stop();
            Ok(())
        } else {
            self.speak(text, message_id).await
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.lock().generation == generation
    }

    fn fail(&self, generation: u64, message_id: MessageId, error: AhmadError) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!(%message_id, "Speech request superseded");
                return Ok(());
            }
            inner.status = AudioStatus::Idle;
        }
        warn!(%message_id, "Speech failed: {}", error);
        self.publish();
        Err(error)
    }

    fn finish(&self, generation: u64) {
        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return;
            }
            inner.cancel = None;
            inner.status = AudioStatus::Idle;
        }
        debug!("Playback finished");
        self.publish();
    }

    /// Hand the current status to the listener if it differs from the last
    /// one published. Always reads the live status, so the final event
    /// matches `status()` however calls interleave.
    fn publish(&self) {
        let published = self.published.lock();
        let status = self.inner.lock().status;
        if published.get() == status {
            return;
        }
        published.set(status);
        if let Some(listener) = &self.listener {
            listener(status);
        }
    }
}

fn cancel_playback(inner: &mut Inner) {
    if let Some(cancel) = inner.cancel.take() {
        cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSynthesizer, ManualSink};
    use std::time::Duration;

    fn controller() -> (AudioController, Arc<FakeSynthesizer>, Arc<ManualSink>) {
        let synth = Arc::new(FakeSynthesizer::new());
        let sink = Arc::new(ManualSink::new());
        let controller = AudioController::new(synth.clone(), sink.clone());
        (controller, synth, sink)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_speak_then_natural_end() {
        let (controller, synth, sink) = controller();
        controller.speak("## Hello", MessageId(1)).await.unwrap();

        assert!(controller.status().is_speaking(MessageId(1)));
        assert_eq!(synth.requests(), vec!["Hello".to_string()]);

        sink.finish_all();
        settle().await;
        assert_eq!(controller.status(), AudioStatus::Idle);
    }

    #[tokio::test]
    async fn test_stop_mid_playback_clears_indicators() {
        let (controller, _, sink) = controller();
        controller.speak("Sannu", MessageId(1)).await.unwrap();

        controller.stop();
        assert_eq!(controller.status(), AudioStatus::Idle);
        assert_eq!(sink.cancelled_count(), 1);

        // The sink ending later must not resurrect anything
        sink.finish_all();
        settle().await;
        assert_eq!(controller.status(), AudioStatus::Idle);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_harmless() {
        let (controller, _, _) = controller();
        controller.stop();
        controller.stop();
        assert_eq!(controller.status(), AudioStatus::Idle);
    }

    #[tokio::test]
    async fn test_stop_while_loading_discards_result() {
        let (controller, synth, sink) = controller();
        let gate = synth.hold();

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.speak("slow", MessageId(9)).await })
        };
        settle().await;
        assert!(controller.status().is_loading(MessageId(9)));

        controller.stop();
        assert_eq!(controller.status(), AudioStatus::Idle);

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(controller.status(), AudioStatus::Idle);
        assert_eq!(sink.started_count(), 0);
    }

    #[tokio::test]
    async fn test_toggle_same_message_stops() {
        let (controller, _, _) = controller();
        controller.toggle("one", MessageId(1)).await.unwrap();
        assert!(controller.status().is_speaking(MessageId(1)));

        controller.toggle("one", MessageId(1)).await.unwrap();
        assert_eq!(controller.status(), AudioStatus::Idle);
    }

    #[tokio::test]
    async fn test_toggle_other_message_switches() {
        let (controller, _, sink) = controller();
        controller.toggle("one", MessageId(1)).await.unwrap();
        controller.toggle("two", MessageId(2)).await.unwrap();

        assert!(controller.status().is_speaking(MessageId(2)));
        assert_eq!(sink.cancelled_count(), 1);
        assert_eq!(sink.started_count(), 2);
    }

    type Recorded = Arc<Mutex<Vec<AudioStatus>>>;

    fn recording_controller() -> (AudioController, Arc<ManualSink>, Recorded) {
        let (controller, _, sink) = controller();
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = events.clone();
        let controller =
            controller.with_listener(Arc::new(move |status: AudioStatus| seen.lock().push(status)));
        (controller, sink, events)
    }

    #[tokio::test]
    async fn test_stop_from_listener_leaves_idle_last() {
        let (controller, synth, sink) = controller();
        let events: Arc<Mutex<Vec<AudioStatus>>> = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<AudioController>>> = Arc::new(Mutex::new(None));

        let controller = {
            let events = events.clone();
            let slot = slot.clone();
            controller.with_listener(Arc::new(move |status: AudioStatus| {
                events.lock().push(status);
                if let AudioStatus::Loading(_) = status {
                    let target = slot.lock().clone();
                    if let Some(target) = target {
                        target.stop();
                    }
                }
            }))
        };
        *slot.lock() = Some(controller.clone());

        controller.speak("Sannu", MessageId(4)).await.unwrap();

        assert_eq!(
            *events.lock(),
            vec![AudioStatus::Loading(MessageId(4)), AudioStatus::Idle]
        );
        assert_eq!(controller.status(), AudioStatus::Idle);
        assert_eq!(synth.requests().len(), 1);
        assert_eq!(sink.started_count(), 0);
    }

    #[tokio::test]
    async fn test_events_follow_status_through_playback() {
        let (controller, sink, events) = recording_controller();
        controller.speak("one", MessageId(1)).await.unwrap();
        controller.stop();
        controller.stop();
        sink.finish_all();
        settle().await;

        assert_eq!(
            *events.lock(),
            vec![
                AudioStatus::Loading(MessageId(1)),
                AudioStatus::Speaking(MessageId(1)),
                AudioStatus::Idle,
            ]
        );
    }

    /// Sink that stops the controller while it is still preparing audio
    struct StoppingSink {
        target: Mutex<Option<AudioController>>,
        cancel: Mutex<Option<CancelFlag>>,
    }

    impl AudioSink for StoppingSink {
        fn play(&self, _audio: crate::audio::AudioData) -> Result<crate::audio::Playback> {
            let target = self.target.lock().clone();
            if let Some(target) = target {
                assert!(target.status().is_loading(MessageId(5)));
                target.stop();
            }
            let playback = crate::audio::Playback::completed();
            *self.cancel.lock() = Some(playback.cancel_flag());
            Ok(playback)
        }
    }

    #[tokio::test]
    async fn test_stop_during_sink_start_cancels_new_playback() {
        let sink = Arc::new(StoppingSink {
            target: Mutex::new(None),
            cancel: Mutex::new(None),
        });
        let events: Arc<Mutex<Vec<AudioStatus>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = events.clone();
        let controller = AudioController::new(Arc::new(FakeSynthesizer::new()), sink.clone())
            .with_listener(Arc::new(move |status: AudioStatus| seen.lock().push(status)));
        *sink.target.lock() = Some(controller.clone());

        controller.speak("Sannu", MessageId(5)).await.unwrap();

        assert_eq!(controller.status(), AudioStatus::Idle);
        assert!(sink.cancel.lock().as_ref().unwrap().is_cancelled());
        assert_eq!(
            *events.lock(),
            vec![AudioStatus::Loading(MessageId(5)), AudioStatus::Idle]
        );
    }

    #[tokio::test]
    async fn test_synthesis_failure_returns_to_idle() {
        let (controller, synth, _) = controller();
        synth.fail_next();

        assert!(controller.speak("oops", MessageId(3)).await.is_err());
        assert_eq!(controller.status(), AudioStatus::Idle);
    }
}
