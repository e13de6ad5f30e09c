//! Vector storage
//!
//! Two backends sit behind the [`VectorStore`] trait:
//! - `local`: a directory holding a manifest and the embedded chunks, searched
//!   in memory with cosine similarity
//! - `qdrant`: a Qdrant collection
//!
//! A store is written once by ingestion and only read by queries.

mod local;
mod payload;
mod qdrant;

pub use local::*;
pub use payload::*;
pub use qdrant::*;

use crate::chunk::Chunk;
use crate::config::{Config, StoreBackend};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A chunk together with its embedding, as written during ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEntry {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f32,
}

/// Read-only similarity search over stored chunks
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return up to `k` chunks most similar to `query`, best first
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of stored chunks
    async fn len(&self) -> Result<usize>;

    /// Human-readable location of the store
    fn location(&self) -> String;
}

/// Describe where the configured store lives
pub fn store_location(config: &Config) -> String {
    match config.store.backend {
        StoreBackend::Local => config.store_path().display().to_string(),
        StoreBackend::Qdrant => format!(
            "{} (collection '{}')",
            config.store.qdrant_url, config.store.collection
        ),
    }
}

/// Check whether the configured store already exists
pub async fn store_exists(config: &Config) -> Result<bool> {
    match config.store.backend {
        StoreBackend::Local => Ok(LocalStore::exists(&config.store_path())),
        StoreBackend::Qdrant => {
            let store = QdrantStore::connect(config)?;
            store.collection_exists().await
        }
    }
}

/// Create the configured store from embedded chunks
pub async fn create_store(config: &Config, model: &str, entries: Vec<StoreEntry>) -> Result<()> {
    match config.store.backend {
        StoreBackend::Local => {
            LocalStore::create(&config.store_path(), model, entries)?;
        }
        StoreBackend::Qdrant => {
            let store = QdrantStore::connect(config)?;
            store.create(entries).await?;
        }
    }
    Ok(())
}

/// Open the configured store for querying
pub async fn open_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    match config.store.backend {
        StoreBackend::Local => Ok(Arc::new(LocalStore::open(&config.store_path())?)),
        StoreBackend::Qdrant => {
            let store = QdrantStore::connect(config)?;
            store.ensure_exists().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_store_location_per_backend() {
        let mut config = Config::default();
        assert!(store_location(&config).ends_with("vectorstore"));

        config.store.backend = StoreBackend::Qdrant;
        assert!(store_location(&config).contains("jobsift_chunks"));
    }

    #[tokio::test]
    async fn test_local_dispatch_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::with_path(&tmp.path().join("jobsift.toml"));
        assert!(!store_exists(&config).await.unwrap());

        let chunk = Chunk::new("a.txt", 0, "hello".to_string());
        create_store(
            &config,
            "model",
            vec![StoreEntry {
                chunk: chunk.clone(),
                embedding: vec![1.0, 0.0],
            }],
        )
        .await
        .unwrap();

        assert!(store_exists(&config).await.unwrap());
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        let hits = store.search(&[1.0, 0.0], 4).await.unwrap();
        assert_eq!(hits[0].chunk, chunk);
    }
}
