use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default = "default_similar_k")]
    pub similar_k: usize,
    #[serde(default = "default_page_cap")]
    pub page_cap: i64,
    #[serde(default = "default_true")]
    pub skip_empty_text: bool,
    #[serde(default = "default_artifact_format")]
    pub artifact_format: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            pool_size: default_pool_size(),
            question_count: default_question_count(),
            similar_k: default_similar_k(),
            page_cap: default_page_cap(),
            skip_empty_text: true,
            artifact_format: default_artifact_format(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data/training_data")
}
fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
fn default_question_count() -> usize {
    2
}
fn default_similar_k() -> usize {
    5
}
fn default_page_cap() -> i64 {
    2
}
fn default_true() -> bool {
    true
}
fn default_artifact_format() -> String {
    "string".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            model_name: default_model_name(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_endpoint_url() -> String {
    "http://localhost:11434/api/chat".to_string()
}
fn default_model_name() -> String {
    "llama3".to_string()
}
fn default_generation_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_index_path(),
            collection: default_collection(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}
fn default_index_path() -> PathBuf {
    PathBuf::from("./data/index.sqlite")
}
fn default_collection() -> String {
    "medical_research".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_dims")]
    pub dims: usize,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: default_dims(),
            url: None,
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "hashing".to_string()
}
fn default_dims() -> usize {
    384
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            level: default_log_level(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("logs/processing.log")
}
fn default_log_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        // Pipeline
        if self.pipeline.pool_size == 0 {
            anyhow::bail!("pipeline.pool_size must be >= 1");
        }
        if self.pipeline.question_count == 0 {
            anyhow::bail!("pipeline.question_count must be >= 1");
        }
        match self.pipeline.artifact_format.as_str() {
            "string" | "raw" | "validated" => {}
            other => anyhow::bail!(
                "Unknown artifact format: '{}'. Must be string, raw, or validated.",
                other
            ),
        }

        // Generation
        if self.generation.endpoint_url.trim().is_empty() {
            anyhow::bail!("generation.endpoint_url must not be empty");
        }
        if self.generation.model_name.trim().is_empty() {
            anyhow::bail!("generation.model_name must not be empty");
        }
        if self.generation.timeout_secs == 0 {
            anyhow::bail!("generation.timeout_secs must be > 0");
        }

        // Index
        match self.index.backend.as_str() {
            "memory" | "sqlite" => {}
            other => anyhow::bail!(
                "Unknown index backend: '{}'. Must be memory or sqlite.",
                other
            ),
        }
        if self.index.collection.trim().is_empty() {
            anyhow::bail!("index.collection must not be empty");
        }

        // Embedding
        if self.embedding.dims == 0 {
            anyhow::bail!("embedding.dims must be > 0");
        }
        if self.embedding.timeout_secs == 0 {
            anyhow::bail!("embedding.timeout_secs must be > 0");
        }
        match self.embedding.provider.as_str() {
            "hashing" | "local" => {}
            "ollama" => {
                if self.embedding.model.is_none() {
                    anyhow::bail!(
                        "embedding.model must be specified when provider is '{}'",
                        self.embedding.provider
                    );
                }
            }
            other => anyhow::bail!(
                "Unknown embedding provider: '{}'. Must be hashing, ollama, or local.",
                other
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.pipeline.question_count, 2);
        assert_eq!(config.pipeline.similar_k, 5);
        assert_eq!(config.pipeline.artifact_format, "string");
        assert_eq!(config.generation.model_name, "llama3");
        assert_eq!(
            config.generation.endpoint_url,
            "http://localhost:11434/api/chat"
        );
        assert_eq!(config.index.collection, "medical_research");
        assert_eq!(config.embedding.provider, "hashing");
        assert!(config.pipeline.pool_size >= 1);
    }

    #[test]
    fn partial_sections_fill_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            pool_size = 3
            output_dir = "/tmp/out"

            [generation]
            model_name = "mistral"
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.pool_size, 3);
        assert_eq!(config.pipeline.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.pipeline.page_cap, 2);
        assert_eq!(config.generation.model_name, "mistral");
        assert_eq!(config.generation.timeout_secs, 300);
    }

    #[test]
    fn zero_pool_size_rejected() {
        let config: Config = toml::from_str("[pipeline]\npool_size = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn unknown_backend_rejected() {
        let config: Config = toml::from_str("[index]\nbackend = \"chroma\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn cloud_embedding_provider_is_rejected() {
        let config: Config =
            toml::from_str("[embedding]\nprovider = \"openai\"\nmodel = \"m\"").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn ollama_embedding_requires_model() {
        let config: Config = toml::from_str("[embedding]\nprovider = \"ollama\"").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("embedding.model"));
    }

    #[test]
    fn unknown_artifact_format_rejected() {
        let config: Config = toml::from_str("[pipeline]\nartifact_format = \"yaml\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config(Path::new("/nonexistent/qagen.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
