use super::pcm::AudioData;
use crate::{AhmadError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

const CHUNK_FRAMES: usize = 1024;

/// Convert mono speech to the output device rate
///
/// Speech arrives at 24 kHz while most devices run at 44.1 or 48 kHz.
pub fn resample_mono(audio: &AudioData, output_rate: u32) -> Result<AudioData> {
    if audio.channels != 1 {
        return Err(AhmadError::AudioDecodeError(format!(
            "expected mono audio, got {} channels",
            audio.channels
        )));
    }
    if audio.sample_rate == 0 || output_rate == 0 {
        return Err(AhmadError::ConfigError(
            "Sample rates must be greater than 0".into(),
        ));
    }
    if audio.sample_rate == output_rate || audio.is_empty() {
        return Ok(AudioData::new(audio.samples.clone(), output_rate, 1));
    }

    let ratio = output_rate as f64 / audio.sample_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, 1)
        .map_err(|e| AhmadError::AudioDecodeError(format!("Failed to create resampler: {}", e)))?;

    let expected = (audio.samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(expected + CHUNK_FRAMES);

    for chunk in audio.samples.chunks(CHUNK_FRAMES) {
        // SincFixedIn wants full chunks; the tail is zero-padded
        let mut frame = vec![0.0f32; CHUNK_FRAMES];
        frame[..chunk.len()].copy_from_slice(chunk);

        let processed = resampler
            .process(&[frame], None)
            .map_err(|e| AhmadError::AudioDecodeError(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&processed[0]);
    }
    output.truncate(expected);

    debug!(
        "Resampled {} Hz -> {} Hz ({} -> {} samples)",
        audio.sample_rate,
        output_rate,
        audio.samples.len(),
        output.len()
    );

    Ok(AudioData::new(output, output_rate, 1))
}
