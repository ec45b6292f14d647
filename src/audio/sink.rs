use super::pcm::AudioData;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Somewhere decoded speech can be played
pub trait AudioSink: Send + Sync {
    /// Start playing `audio`; the returned handle reports when playback ends
    fn play(&self, audio: AudioData) -> Result<Playback>;
}

/// Shared cancel flag for one playback
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Caller side of a running playback
#[derive(Debug)]
pub struct Playback {
    cancel: CancelFlag,
    finished: oneshot::Receiver<()>,
}

/// Sink side of a running playback
#[derive(Debug)]
pub struct PlaybackControl {
    cancel: CancelFlag,
    finished: Option<oneshot::Sender<()>>,
}

impl Playback {
    pub fn channel() -> (Playback, PlaybackControl) {
        let cancel = CancelFlag::default();
        let (tx, rx) = oneshot::channel();
        (
            Playback {
                cancel: cancel.clone(),
                finished: rx,
            },
            PlaybackControl {
                cancel,
                finished: Some(tx),
            },
        )
    }

    /// A playback that has already ended
    pub fn completed() -> Playback {
        let (playback, control) = Self::channel();
        control.finish();
        playback
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Resolve once the sink reports the end of playback (or goes away)
    pub async fn wait(self) {
        let _ = self.finished.await;
    }
}

impl PlaybackControl {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn finish(mut self) {
        if let Some(tx) = self.finished.take() {
            let _ = tx.send(());
        }
    }
}

/// Discards audio; playback ends immediately
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&self, _audio: AudioData) -> Result<Playback> {
        Ok(Playback::completed())
    }
}
