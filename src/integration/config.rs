//! Configuration for the chat engine
//!
//! Provides centralized configuration for all components.

use crate::sync::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Hosted model settings
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key sent with every request
    pub api_key: String,

    /// Service root, overridable for testing
    pub base_url: String,

    /// Model used for explanations and translations
    pub text_model: String,

    /// Model used for speech synthesis
    pub speech_model: String,

    /// Prebuilt voice name
    pub voice: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Optional per-request timeout (none by default)
    pub request_timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            temperature: 0.7,
            request_timeout: None,
        }
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Streaming reply settings
#[derive(Clone, Debug)]
pub struct StreamConfig {
    /// Use the streaming completion call
    pub enabled: bool,

    /// How often the visible reply text is refreshed
    pub flush_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flush_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Clone, Debug)]
pub struct QuizConfig {
    /// Words needed before a quiz can start
    pub min_words: usize,

    /// Pause between feedback and the next question
    pub feedback_delay: Duration,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            min_words: 3,
            feedback_delay: Duration::from_millis(1500),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Directory holding the persisted keys
    pub data_dir: Option<PathBuf>,

    /// Writes are coalesced over this window
    pub debounce: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir().map(|dir| dir.join("ahmad")),
            debounce: Duration::from_millis(300),
        }
    }
}

/// Where synthesized speech goes
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AudioOutput {
    /// Default output device
    #[default]
    Speaker,
    /// One WAV file per utterance in this directory
    WavDir(PathBuf),
    /// Synthesize nothing
    Muted,
}

#[derive(Clone, Debug)]
pub struct AudioConfig {
    /// Speak replies automatically once they arrive
    pub auto_speak: bool,

    pub output: AudioOutput,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            auto_speak: true,
            output: AudioOutput::Speaker,
        }
    }
}

/// Configuration for the complete engine
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub stream: StreamConfig,
    pub quiz: QuizConfig,
    pub store: StoreConfig,
    pub retry: RetryPolicy,
    pub audio: AudioConfig,
}

impl AppConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            gemini: GeminiConfig::new(api_key),
            ..Default::default()
        }
    }

    pub fn with_gemini(mut self, gemini: GeminiConfig) -> Self {
        self.gemini = gemini;
        self
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.stream.enabled = enabled;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.stream.flush_interval = interval;
        self
    }

    pub fn with_quiz_delay(mut self, delay: Duration) -> Self {
        self.quiz.feedback_delay = delay;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.store.data_dir = Some(data_dir.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_auto_speak(mut self, auto_speak: bool) -> Self {
        self.audio.auto_speak = auto_speak;
        self
    }

    pub fn with_audio_output(mut self, output: AudioOutput) -> Self {
        self.audio.output = output;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.gemini.api_key.trim().is_empty() {
            return Err("API key is required (set GEMINI_API_KEY or API_KEY)".to_string());
        }

        if self.stream.flush_interval.is_zero() {
            return Err("Stream flush interval must be greater than 0".to_string());
        }

        if let AudioOutput::WavDir(dir) = &self.audio.output {
            if dir.as_os_str().is_empty() {
                return Err("WAV output directory must not be empty".to_string());
            }
        }

        if self.quiz.min_words == 0 {
            return Err("Quiz needs at least one word".to_string());
        }

        self.retry.validate()
    }
}
