//! Text generation trait.

use async_trait::async_trait;

use crate::error::Result;

/// A completion backend that turns a prompt into text.
///
/// Implementations perform a single non-streaming request per call and
/// do not retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
