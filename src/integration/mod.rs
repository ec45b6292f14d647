//! Wiring of the chat components into one engine

pub mod config;
pub mod engine;
pub mod events;

pub use config::{
    AppConfig, AudioConfig, AudioOutput, GeminiConfig, QuizConfig, StoreConfig, StreamConfig,
};
pub use engine::{ChatEngine, ChatSnapshot, Collaborators};
pub use events::{ChatEvent, EventBus, NoticeKind};
