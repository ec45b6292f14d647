use crate::{AhmadError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Sample rate of synthesized speech
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Decoded audio ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioData {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Decode base64 little-endian 16-bit mono PCM at 24 kHz
pub fn decode_base64_pcm(encoded: &str) -> Result<AudioData> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AhmadError::AudioDecodeError(format!("invalid base64: {}", e)))?;
    pcm16_to_audio(&bytes, SPEECH_SAMPLE_RATE)
}

/// Convert raw little-endian 16-bit mono PCM into normalized samples
pub fn pcm16_to_audio(bytes: &[u8], sample_rate: u32) -> Result<AudioData> {
    if bytes.len() % 2 != 0 {
        return Err(AhmadError::AudioDecodeError(format!(
            "odd PCM byte length: {}",
            bytes.len()
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(AudioData::new(samples, sample_rate, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_samples() {
        // 0, i16::MAX, i16::MIN, -1
        let bytes = [0x00, 0x00, 0xff, 0x7f, 0x00, 0x80, 0xff, 0xff];
        let audio = decode_base64_pcm(&STANDARD.encode(bytes)).unwrap();

        assert_eq!(audio.sample_rate, SPEECH_SAMPLE_RATE);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.samples.len(), 4);
        assert_eq!(audio.samples[0], 0.0);
        assert!((audio.samples[1] - 32767.0 / 32768.0).abs() < f32::EPSILON);
        assert_eq!(audio.samples[2], -1.0);
        assert!(audio.samples[3] < 0.0);
    }

    #[test]
    fn test_duration() {
        let audio = pcm16_to_audio(&vec![0u8; 48_000], SPEECH_SAMPLE_RATE).unwrap();
        assert!((audio.duration_seconds() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_input() {
        assert!(decode_base64_pcm("not base64!").is_err());
        assert!(pcm16_to_audio(&[0x01, 0x02, 0x03], SPEECH_SAMPLE_RATE).is_err());
    }
}
