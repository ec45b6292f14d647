use super::pcm::AudioData;
use super::sink::{AudioSink, Playback};
use crate::{AhmadError, Result};
use chrono::Utc;
use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write audio samples to a 16-bit WAV file
pub fn write_wav<P: AsRef<Path>>(path: P, audio: &AudioData) -> Result<()> {
    let spec = WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| AhmadError::IOError(format!("Failed to create WAV writer: {}", e)))?;

    for &sample in &audio.samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| AhmadError::IOError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| AhmadError::IOError(format!("Failed to finalize WAV file: {}", e)))?;

    info!(
        "Wrote {:.1}s of speech to {:?}",
        audio.duration_seconds(),
        path.as_ref()
    );
    Ok(())
}

/// Saves each utterance as a WAV file instead of playing it
pub struct WavSink {
    dir: PathBuf,
    counter: Mutex<u32>,
}

impl WavSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            counter: Mutex::new(0),
        })
    }

    fn next_path(&self) -> PathBuf {
        let mut counter = self.counter.lock();
        *counter += 1;
        self.dir.join(format!(
            "ahmad-{}-{:03}.wav",
            Utc::now().format("%Y%m%d-%H%M%S"),
            *counter
        ))
    }
}

impl AudioSink for WavSink {
    fn play(&self, audio: AudioData) -> Result<Playback> {
        write_wav(self.next_path(), &audio)?;
        Ok(Playback::completed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = WavSink::new(dir.path()).unwrap();

        sink.play(AudioData::new(vec![0.0, 0.5, -0.5], 24_000, 1)).unwrap();
        sink.play(AudioData::new(vec![0.25; 100], 24_000, 1)).unwrap();

        let mut files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        assert_eq!(files.len(), 2);

        let reader = hound::WavReader::open(&files[0]).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 3);
    }
}
