//! Ollama embedding and generation gateways.
//!
//! This module is only available when the `ollama` feature is enabled.
//! Both clients speak Ollama's JSON HTTP API through `reqwest`; neither
//! retries a failed request.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;

/// The default Ollama base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default embedding endpoint (batch form).
pub const DEFAULT_EMBED_ENDPOINT: &str = "/api/embed";

/// The default non-streaming completion endpoint.
pub const DEFAULT_GENERATE_ENDPOINT: &str = "/api/generate";

const PROVIDER: &str = "Ollama";

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagError::Config(format!("failed to build Ollama HTTP client: {e}")))
}

/// Read an error body and turn it into a short message.
async fn status_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
    format!("Ollama returned {status}: {detail}")
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by Ollama's `/api/embed` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use ragpipe_rag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new("http://localhost:11434", "nomic-embed-text", 768)?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Default request timeout for embedding calls.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a provider for `model`, whose vectors have `dimensions` entries.
    pub fn new(base_url: &str, model: impl Into<String>, dimensions: usize) -> Result<Self> {
        Ok(Self {
            client: build_client(Self::DEFAULT_TIMEOUT)?,
            url: format!("{}{DEFAULT_EMBED_ENDPOINT}", base_url.trim_end_matches('/')),
            model: model.into(),
            dimensions,
        })
    }

    /// Override the endpoint path appended to the base URL.
    pub fn with_endpoint(mut self, base_url: &str, endpoint: &str) -> Self {
        self.url = format!("{}{endpoint}", base_url.trim_end_matches('/'));
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    fn err(message: String) -> RagError {
        RagError::Embedding { provider: PROVIDER.into(), message }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::err("no embeddings found".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { model: &self.model, input: texts })
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embedding request failed");
                Self::err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = status_error(response).await;
            error!(provider = PROVIDER, %message, "embedding API error");
            return Err(Self::err(message));
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to decode embedding response");
            Self::err(format!("failed to decode response: {e}"))
        })?;

        if body.embeddings.len() != texts.len() {
            return Err(Self::err(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }

        Ok(body.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Generation ─────────────────────────────────────────────────────

/// A [`TextGenerator`] backed by Ollama's `/api/generate` endpoint.
///
/// Requests are sent with `stream: false`.
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    /// Default request timeout for completion calls.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Default sampling temperature.
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;

    /// Create a generator for `model`.
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(Self::DEFAULT_TIMEOUT)?,
            url: format!("{}{DEFAULT_GENERATE_ENDPOINT}", base_url.trim_end_matches('/')),
            model: model.into(),
            temperature: Self::DEFAULT_TEMPERATURE,
        })
    }

    /// Override the endpoint path appended to the base URL.
    pub fn with_endpoint(mut self, base_url: &str, endpoint: &str) -> Self {
        self.url = format!("{}{endpoint}", base_url.trim_end_matches('/'));
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    fn err(message: String) -> RagError {
        RagError::Generation { provider: PROVIDER.into(), message }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "generating");

        let request = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        let response = self.client.post(&self.url).json(&request).send().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "generation request failed");
            Self::err(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let message = status_error(response).await;
            error!(provider = PROVIDER, %message, "generation API error");
            return Err(Self::err(message));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to decode generation response");
            Self::err(format!("failed to decode response: {e}"))
        })?;

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_base_and_endpoint() {
        let embedder = OllamaEmbeddingProvider::new("http://ollama:11434/", "nomic", 768).unwrap();
        assert_eq!(embedder.url, "http://ollama:11434/api/embed");
        assert_eq!(embedder.dimensions(), 768);

        let generator = OllamaGenerator::new("http://ollama:11434", "llama3.2")
            .unwrap()
            .with_endpoint("http://ollama:11434", "/api/chat-like");
        assert_eq!(generator.url, "http://ollama:11434/api/chat-like");
    }

    #[test]
    fn embed_request_serializes_input_array() {
        let texts = ["a", "b"];
        let body = serde_json::to_value(EmbedRequest { model: "m", input: &texts }).unwrap();
        assert_eq!(body, json!({"model": "m", "input": ["a", "b"]}));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_request() {
        let embedder = OllamaEmbeddingProvider::new("http://127.0.0.1:9", "m", 4).unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }
}
