//! Deterministic gateway stubs for tests and demos.
//!
//! Available under `cfg(test)` or with the `testing` feature. None of these
//! types talk to the network.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::document::{Point, ScoredPoint};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;
use crate::inmemory::InMemoryVectorStore;
use crate::vectorstore::VectorStore;

/// Bag-of-words embedder over a fixed vocabulary.
///
/// Each vocabulary word owns one dimension holding its count in the text
/// (case-insensitive, surrounding punctuation ignored). A final bias
/// dimension is always `1.0`, so no vector is ever zero.
pub struct VocabularyEmbedder {
    vocabulary: Vec<String>,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    failing: AtomicBool,
}

impl VocabularyEmbedder {
    /// Create an embedder whose dimensions are `vocabulary.len() + 1`.
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: vocabulary.into_iter().map(|w| w.into().to_lowercase()).collect(),
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every following call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls so far.
    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    /// Number of `embed_batch` calls so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Embed without touching the call counters.
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.vocabulary.len() + 1];
        for token in text.split_whitespace() {
            let word = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if let Some(i) = self.vocabulary.iter().position(|v| *v == word) {
                vector[i] += 1.0;
            }
        }
        vector[self.vocabulary.len()] = 1.0;
        vector
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RagError::Embedding {
                provider: "Vocabulary".into(),
                message: "embedding backend unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for VocabularyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len() + 1
    }
}

type Reply = Box<dyn Fn(&str) -> String + Send + Sync>;

/// A generator that records prompts and answers through a closure.
pub struct RecordingGenerator {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingGenerator {
    /// Answer every prompt with `f(prompt)`.
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self { reply: Box::new(f), prompts: Mutex::new(Vec::new()), failing: AtomicBool::new(false) }
    }

    /// Answer every prompt with the same text.
    pub fn fixed(answer: impl Into<String>) -> Self {
        let answer = answer.into();
        Self::new(move |_| answer.clone())
    }

    /// Make every following call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RagError::Generation {
                provider: "Recording".into(),
                message: "generation backend unavailable".into(),
            });
        }
        Ok((self.reply)(prompt))
    }
}

/// An [`InMemoryVectorStore`] that counts calls by kind.
#[derive(Default)]
pub struct CountingVectorStore {
    inner: InMemoryVectorStore,
    creates: AtomicUsize,
    upserts: AtomicUsize,
    searches: AtomicUsize,
    failing_search: AtomicBool,
    failing_upsert: AtomicBool,
}

impl CountingVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped store.
    pub fn inner(&self) -> &InMemoryVectorStore {
        &self.inner
    }

    /// Make every following search fail (or succeed again).
    pub fn set_failing_search(&self, failing: bool) {
        self.failing_search.store(failing, Ordering::SeqCst);
    }

    /// Make every following upsert fail (or succeed again).
    pub fn set_failing_upsert(&self, failing: bool) {
        self.failing_upsert.store(failing, Ordering::SeqCst);
    }

    /// Number of `create_collection` calls so far.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `upsert` calls so far.
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Number of `search` calls so far.
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for CountingVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.inner.collection_exists(name).await
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_collection(name, dimensions).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.failing_upsert.load(Ordering::SeqCst) {
            return Err(RagError::VectorStore {
                backend: "Counting".into(),
                message: "upsert backend unavailable".into(),
            });
        }
        self.inner.upsert(collection, points).await
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.failing_search.load(Ordering::SeqCst) {
            return Err(RagError::VectorStore {
                backend: "Counting".into(),
                message: "search backend unavailable".into(),
            });
        }
        self.inner.search(collection, vector, limit).await
    }
}
