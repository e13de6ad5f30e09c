//! Default values for configuration

use super::{PipelineMode, StoreBackend};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "jobsift.toml";

/// Default OpenAI-compatible API base URL
pub fn default_openai_base_url() -> String {
    std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

/// Default environment variable holding the API key
pub fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

/// Default batch size for embedding requests
pub fn default_embedding_batch_size() -> usize {
    64
}

/// Default chat model used for rewriting and answering
pub fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Default sampling temperature (deterministic answers)
pub fn default_llm_temperature() -> f32 {
    0.0
}

/// Default maximum characters per chunk
pub fn default_chunk_size() -> usize {
    1000
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Preferred data directory, used when it exists
pub fn default_data_dir() -> &'static str {
    "data"
}

/// Bundled sample data directory, used when `data` is absent
pub fn fallback_data_dir() -> &'static str {
    "sample_data"
}

/// Default file extensions picked up by ingestion
pub fn default_ingest_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

/// Default vector store backend
pub fn default_store_backend() -> StoreBackend {
    StoreBackend::Local
}

/// Default local store directory
pub fn default_store_path() -> String {
    "vectorstore".to_string()
}

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default Qdrant collection name
pub fn default_collection_name() -> String {
    "jobsift_chunks".to_string()
}

/// Default query pipeline design
pub fn default_pipeline_mode() -> PipelineMode {
    PipelineMode::MultiQuery
}

/// Default number of chunks retrieved per query
pub fn default_top_k() -> usize {
    4
}

/// Default number of generated query variants
pub fn default_num_queries() -> usize {
    3
}

/// Default: also retrieve with the user's own question
pub fn default_include_original() -> bool {
    true
}
