//! Speech playback: PCM decoding, output sinks and the playback controller

pub mod controller;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod pcm;
pub mod resampler;
pub mod sink;
pub mod wav;

pub use controller::{AudioController, AudioStatus};
#[cfg(feature = "audio-io")]
pub use output::CpalSink;
pub use pcm::{decode_base64_pcm, AudioData, SPEECH_SAMPLE_RATE};
pub use resampler::resample_mono;
pub use sink::{AudioSink, CancelFlag, NullSink, Playback, PlaybackControl};
pub use wav::{write_wav, WavSink};
