use super::pcm::AudioData;
use super::resampler::resample_mono;
use super::sink::{AudioSink, Playback, PlaybackControl};
use crate::{AhmadError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Plays speech on the default output device
///
/// Each utterance gets its own output stream on a dedicated thread; the
/// stream is dropped as soon as playback ends or is cancelled.
pub struct CpalSink {
    config: StreamConfig,
}

impl CpalSink {
    /// Create a sink for the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| AhmadError::AudioDeviceError("No output device available".into()))?;

        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_output_config()
            .map_err(|e| {
                AhmadError::AudioDeviceError(format!("Failed to get output config: {}", e))
            })?
            .into();

        Ok(Self { config })
    }

    /// Get the sample rate of the output device
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Get the number of channels
    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl AudioSink for CpalSink {
    fn play(&self, audio: AudioData) -> Result<Playback> {
        let audio = resample_mono(&audio, self.sample_rate())?;
        let config = self.config.clone();
        let (playback, control) = Playback::channel();

        std::thread::Builder::new()
            .name("ahmad-playback".into())
            .spawn(move || {
                if let Err(e) = play_blocking(&config, audio, &control) {
                    error!("Audio playback failed: {}", e);
                }
                control.finish();
            })?;

        Ok(playback)
    }
}

fn play_blocking(config: &StreamConfig, audio: AudioData, control: &PlaybackControl) -> Result<()> {
    if audio.is_empty() {
        return Ok(());
    }

    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AhmadError::AudioDeviceError("No output device available".into()))?;

    let channels = config.channels as usize;
    let samples = Arc::new(audio.samples);
    let position = Arc::new(AtomicUsize::new(0));
    let drained = Arc::new(AtomicBool::new(false));

    let stream = {
        let samples = Arc::clone(&samples);
        let position = Arc::clone(&position);
        let drained = Arc::clone(&drained);
        device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let pos = position.fetch_add(1, Ordering::Relaxed);
                        let sample = match samples.get(pos) {
                            Some(&s) => s,
                            None => {
                                drained.store(true, Ordering::Relaxed);
                                0.0
                            }
                        };
                        frame.fill(sample);
                    }
                },
                |err| error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| {
                AhmadError::AudioDeviceError(format!("Failed to build output stream: {}", e))
            })?
    };

    stream
        .play()
        .map_err(|e| AhmadError::AudioDeviceError(format!("Failed to start output stream: {}", e)))?;
    debug!("Playback started ({} samples)", samples.len());

    while !drained.load(Ordering::Relaxed) && !control.is_cancelled() {
        std::thread::sleep(POLL_INTERVAL);
    }

    drop(stream);
    debug!(
        cancelled = control.is_cancelled(),
        "Playback stopped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpal_sink_creation() {
        // May fail in CI environments without audio devices
        if let Ok(sink) = CpalSink::new() {
            assert!(sink.sample_rate() > 0);
            assert!(sink.channels() > 0);
        }
    }
}
