//! Collaborator traits for the hosted text and speech services

use crate::vocab::Category;
use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A finite, non-restartable sequence of reply fragments
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Text generation service
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate the full reply for `prompt`
    async fn complete(
        &self,
        prompt: &str,
        category: Category,
        known_words: &[String],
    ) -> Result<String>;

    /// Generate the reply as a stream of fragments
    async fn complete_stream(
        &self,
        prompt: &str,
        category: Category,
        known_words: &[String],
    ) -> Result<FragmentStream>;
}

/// Speech synthesis service
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Base64-encoded little-endian 16-bit PCM, mono, 24 kHz
    async fn synthesize(&self, text: &str) -> Result<String>;
}
