// Gemini API client module

mod client;

pub use client::GeminiClient;

use crate::error::Result;
use async_trait::async_trait;

/// Something that can answer a conversion prompt.
///
/// The conversion service only depends on this trait, so tests can swap the
/// hosted model for a canned backend.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Send `prompt` and return the raw answer text.
    async fn translate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, part of cache keys and log lines.
    fn model(&self) -> &str;
}
