pub mod audio;
pub mod integration;
pub mod llm;
pub mod messages;
pub mod quiz;
pub mod store;
pub mod sync;
#[doc(hidden)]
pub mod testing;
pub mod vocab;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AhmadError {
    #[error("Completion error: {0}")]
    CompletionError(String),

    #[error("Speech synthesis error: {0}")]
    SpeechError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio decode error: {0}")]
    AudioDecodeError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Quiz is active: {0}")]
    QuizActive(String),
}

impl From<std::io::Error> for AhmadError {
    fn from(e: std::io::Error) -> Self {
        AhmadError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for AhmadError {
    fn from(e: reqwest::Error) -> Self {
        AhmadError::HttpError(e.to_string())
    }
}

impl From<serde_json::Error> for AhmadError {
    fn from(e: serde_json::Error) -> Self {
        AhmadError::StorageError(e.to_string())
    }
}

impl AhmadError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Connectivity problems clear up on their own
            AhmadError::CompletionError(_) => true,
            AhmadError::SpeechError(_) => true,
            AhmadError::HttpError(_) => true,
            AhmadError::AudioDecodeError(_) => true,
            AhmadError::QuizActive(_) => true,
            // Device and setup errors need the user
            AhmadError::AudioDeviceError(_) => false,
            AhmadError::ConfigError(_) => false,
            AhmadError::StorageError(_) => false,
            AhmadError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            AhmadError::CompletionError(_) | AhmadError::HttpError(_) => {
                "It seems there was an issue connecting. Your message will be sent when the connection is back.".to_string()
            }
            AhmadError::SpeechError(_) | AhmadError::AudioDecodeError(_) => {
                "Sorry, I couldn't read that aloud. The text is still here for you.".to_string()
            }
            AhmadError::AudioDeviceError(_) => {
                "Audio device error. Please check your speakers.".to_string()
            }
            AhmadError::StorageError(_) | AhmadError::IOError(_) => {
                "Could not save your conversation.".to_string()
            }
            AhmadError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            AhmadError::QuizActive(_) => {
                "Please finish the quiz first.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AhmadError>;
