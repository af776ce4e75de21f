//! YAML service configuration.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a runnable local setup against Ollama and Qdrant on their
//! standard ports.

use std::path::{Path, PathBuf};

use ragpipe_eval::EvalSettings;
use ragpipe_rag::RagConfig;
use ragpipe_server::ServerConfig;
use ragpipe_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location of the config file.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

pub const ENV_QDRANT_URL: &str = "RAGPIPE_QDRANT_URL";
pub const ENV_OLLAMA_URL: &str = "RAGPIPE_OLLAMA_URL";
pub const ENV_PORT: &str = "RAGPIPE_PORT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub host: String,
    pub port: u16,
    /// Collection served by the ask/store endpoints.
    pub collection: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, collection: "documents".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSection {
    /// Words per chunk.
    pub size: usize,
    /// Words shared by consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkSection {
    fn default() -> Self {
        Self { size: 300, overlap: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantSection {
    /// gRPC endpoint.
    pub url: String,
}

impl Default for QdrantSection {
    fn default() -> Self {
        Self { url: "http://localhost:6334".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub model_name: String,
    pub model_dimension: usize,
    pub endpoint: String,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            model_name: "nomic-embed-text".to_string(),
            model_dimension: 768,
            endpoint: "/api/embed".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OllamaSection {
    fn default() -> Self {
        Self { base_url: "http://localhost:11434".to_string(), timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    pub model_name: String,
    pub endpoint: String,
    pub temperature: f32,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            model_name: "llama3.2".to_string(),
            endpoint: "/api/generate".to_string(),
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    /// Chunks retrieved per evaluation question.
    pub top_k: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self { top_k: ragpipe_eval::DEFAULT_EVAL_TOP_K }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSection {
    pub source_data_path: PathBuf,
    pub retrieval_data_path: PathBuf,
    pub generation_data_path: PathBuf,
    pub collection_name: String,
}

impl Default for EvaluationSection {
    fn default() -> Self {
        let settings = EvalSettings::default();
        Self {
            source_data_path: settings.source_data_path,
            retrieval_data_path: settings.retrieval_data_path,
            generation_data_path: settings.generation_data_path,
            collection_name: "eval_collection".to_string(),
        }
    }
}

/// The whole config file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiSection,
    pub chunk: ChunkSection,
    pub qdrant: QdrantSection,
    pub embedding: EmbeddingSection,
    pub ollama: OllamaSection,
    pub generator: GeneratorSection,
    pub retrieval: RetrievalSection,
    pub evaluation: EvaluationSection,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Parse YAML text. `origin` only labels errors.
    pub fn from_yaml(yaml: &str, origin: &Path) -> Result<Self> {
        // serde_yaml rejects an empty document, but an empty file means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|source| ConfigError::Parse { path: origin.to_path_buf(), source })
    }

    /// Load, apply environment overrides, and validate.
    ///
    /// With no explicit path, `config.yaml` is used when present and the
    /// built-in defaults otherwise. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with overrides read through `lookup` instead of
    /// the process environment.
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::read(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_yaml(&yaml, path)
    }

    /// Apply `RAGPIPE_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_QDRANT_URL) {
            self.qdrant.url = url;
        }
        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            self.ollama.base_url = url;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.api.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_PORT}='{port}' is not a port")))?;
        }
        Ok(())
    }

    /// Reject settings no gateway could work with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk.size == 0 {
            return Err(ConfigError::Invalid("chunk.size must be greater than zero".into()));
        }
        if self.chunk.overlap >= self.chunk.size {
            return Err(ConfigError::Invalid(format!(
                "chunk.overlap ({}) must be less than chunk.size ({})",
                self.chunk.overlap, self.chunk.size
            )));
        }
        if self.embedding.model_dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.model_dimension must be greater than zero".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be greater than zero".into()));
        }
        if self.api.collection.is_empty() || self.evaluation.collection_name.is_empty() {
            return Err(ConfigError::Invalid("collection names must not be empty".into()));
        }
        Ok(())
    }

    pub fn rag_config(&self) -> Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk.size)
            .chunk_overlap(self.chunk.overlap)
            .dimensions(self.embedding.model_dimension)
            .build()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn eval_settings(&self) -> EvalSettings {
        EvalSettings {
            source_data_path: self.evaluation.source_data_path.clone(),
            retrieval_data_path: self.evaluation.retrieval_data_path.clone(),
            generation_data_path: self.evaluation.generation_data_path.clone(),
            top_k: self.retrieval.top_k,
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig { host: self.api.host.clone(), port: self.api.port }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse(yaml: &str) -> Result<AppConfig> {
        AppConfig::from_yaml(yaml, Path::new("test.yaml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse(
            "chunk:\n  size: 50\nembedding:\n  model_name: mxbai-embed-large\n  model_dimension: 1024\n",
        )
        .unwrap();

        assert_eq!(config.chunk, ChunkSection { size: 50, overlap: 30 });
        assert_eq!(config.embedding.model_dimension, 1024);
        assert_eq!(config.embedding.endpoint, "/api/embed");
        assert_eq!(config.api.collection, "documents");
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let err = parse("chunk: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("test.yaml"));
    }

    #[test]
    fn validation_rejects_unusable_values() {
        let mut config = AppConfig::default();
        config.chunk.overlap = config.chunk.size;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.embedding.model_dimension = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_replace_urls_and_port() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_QDRANT_URL, "http://qdrant:6334"),
            (ENV_OLLAMA_URL, "http://ollama:11434"),
            (ENV_PORT, "9090"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.qdrant.url, "http://qdrant:6334");
        assert_eq!(config.ollama.base_url, "http://ollama:11434");
        assert_eq!(config.server_config().port, 9090);
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_PORT).then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn derived_settings_follow_sections() {
        let config = AppConfig::default();
        let rag = config.rag_config().unwrap();
        assert_eq!((rag.chunk_size, rag.chunk_overlap, rag.dimensions), (300, 30, 768));
        assert_eq!(config.eval_settings().top_k, 5);
    }
}
