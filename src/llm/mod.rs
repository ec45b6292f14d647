//! Hosted language model integration
//!
//! - **client**: collaborator traits for text completion and speech synthesis
//! - **gemini**: REST implementation of both collaborators
//! - **prompts**: the tutor's system instruction
//! - **directive**: `<WORD>` directive extraction and text cleanup

pub mod client;
pub mod directive;
pub mod gemini;
pub mod prompts;

pub use client::{CompletionClient, FragmentStream, SpeechSynthesizer};
pub use directive::{process_reply, speech_text, streaming_display, ProcessedReply};
pub use gemini::GeminiClient;
pub use prompts::{build_system_instruction, TEACH_ME_PROMPT};
