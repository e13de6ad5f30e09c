//! Configuration management for jobsift
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAI-compatible API connection
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Document loading configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Vector store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Query pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL of the API (e.g. https://api.openai.com/v1)
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Environment variable name holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds (unset: HTTP client default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Texts per embedding request
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

/// Generation model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub size: usize,

    /// Overlap characters between chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

/// Document loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory of documents (unset: `data` if present, else `sample_data`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// File extensions to load
    #[serde(default = "default_ingest_extensions")]
    pub extensions: Vec<String>,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
}

/// Vector store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// File-backed store in a local directory
    Local,
    /// Qdrant collection
    Qdrant,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Local => write!(f, "local"),
            StoreBackend::Qdrant => write!(f, "qdrant"),
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend holds the vectors
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,

    /// Local store directory
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Qdrant connection URL
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Qdrant collection name
    #[serde(default = "default_collection_name")]
    pub collection: String,
}

/// Query pipeline design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineMode {
    /// Retrieve with the question as asked
    Direct,
    /// Rewrite the question for retrieval first
    Rewrite,
    /// Retrieve with several generated phrasings and merge
    MultiQuery,
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Direct => write!(f, "direct"),
            PipelineMode::Rewrite => write!(f, "rewrite"),
            PipelineMode::MultiQuery => write!(f, "multi-query"),
        }
    }
}

/// Query pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Which pipeline design answers questions
    #[serde(default = "default_pipeline_mode")]
    pub mode: PipelineMode,

    /// Chunks retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Generated query variants (multi-query only)
    #[serde(default = "default_num_queries")]
    pub num_queries: usize,

    /// Also retrieve with the original question (multi-query only)
    #[serde(default = "default_include_original")]
    pub include_original: bool,
}

/// Internal paths configuration
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Directory relative paths are resolved against
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            chunk: ChunkConfig::default(),
            ingest: IngestConfig::default(),
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            temperature: default_llm_temperature(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            extensions: default_ingest_extensions(),
            recursive: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
            qdrant_url: default_qdrant_url(),
            collection: default_collection_name(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: default_pipeline_mode(),
            top_k: default_top_k(),
            num_queries: default_num_queries(),
            include_original: default_include_original(),
        }
    }
}

impl Config {
    /// Get the default config file path (in the working directory)
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Point paths at a config file; relative paths resolve against its directory
    fn init_paths(&mut self, config_path: &Path) {
        let base = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.paths = PathsConfig {
            base_dir: base,
            config_file: config_path.to_path_buf(),
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.init_paths(config_path);

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file if it exists, otherwise use defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);

        if path.exists() {
            return Self::load(&path);
        }

        if config_path.is_some() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        debug!("No config file found, using defaults");
        let mut config = Config::default();
        config.init_paths(&path);
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Create a default configuration that will be saved at `config_path`
    pub fn with_path(config_path: &Path) -> Self {
        let mut config = Config::default();
        config.init_paths(config_path);
        config
    }

    /// Resolve a possibly relative path against the config directory
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.base_dir.join(path)
        }
    }

    /// Directory holding the local vector store
    pub fn store_path(&self) -> PathBuf {
        self.resolve_path(&self.store.path)
    }

    /// Directory documents are loaded from
    ///
    /// An explicit override wins, then `ingest.data_dir`, then `data` when it
    /// exists, and finally `sample_data`.
    pub fn data_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = override_dir {
            return dir.to_path_buf();
        }
        if let Some(dir) = &self.ingest.data_dir {
            return self.resolve_path(dir);
        }
        let preferred = self.resolve_path(default_data_dir());
        if preferred.exists() {
            preferred
        } else {
            self.resolve_path(fallback_data_dir())
        }
    }

    /// Get the API key from the environment
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.openai.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(format!(
                "Missing API credentials: set the {} environment variable",
                self.openai.api_key_env
            ))),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.size == 0 {
            return Err(Error::Config("chunk.size must be positive".to_string()));
        }

        if self.chunk.overlap >= self.chunk.size {
            return Err(Error::Config(
                "chunk.overlap must be < chunk.size".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be positive".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.ingest.extensions.is_empty() {
            return Err(Error::Config(
                "ingest.extensions must list at least one extension".to_string(),
            ));
        }

        if self.pipeline.top_k == 0 {
            return Err(Error::Config("pipeline.top_k must be >= 1".to_string()));
        }

        if self.pipeline.num_queries == 0 {
            return Err(Error::Config(
                "pipeline.num_queries must be >= 1".to_string(),
            ));
        }

        Ok(())
    }
}
