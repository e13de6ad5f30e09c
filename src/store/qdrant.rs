//! Qdrant vector database integration
//!
//! This module wraps the Qdrant client and provides:
//! - Collection creation sized to the ingested embeddings
//! - Batched point upserts, removing the collection again if one fails
//! - Vector search returning verbatim chunk payloads

use super::local::validate_entries;
use super::{json_from_qdrant_value, ChunkPayload, ChunkPoint, ScoredChunk, StoreEntry, VectorStore};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, warn};

const UPSERT_BATCH_SIZE: usize = 256;

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    url: String,
    collection: String,
}

impl QdrantStore {
    /// Connect to Qdrant using config
    pub fn connect(config: &Config) -> Result<Self> {
        Self::new(&config.store.qdrant_url, &config.store.collection)
    }

    /// Create a new store connection directly with URL and collection name
    pub fn new(url: &str, collection: &str) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.to_string(),
        })
    }

    /// Check if the collection exists
    pub async fn collection_exists(&self) -> Result<bool> {
        let exists = self.client.collection_exists(&self.collection).await?;
        Ok(exists)
    }

    /// Fail unless the collection has been created by ingestion
    pub async fn ensure_exists(&self) -> Result<()> {
        if self.collection_exists().await? {
            Ok(())
        } else {
            Err(Error::Store(format!(
                "No Qdrant collection '{}' at {}; run `jobsift ingest` first",
                self.collection, self.url
            )))
        }
    }

    /// Create the collection and upsert all entries
    pub async fn create(&self, entries: Vec<StoreEntry>) -> Result<()> {
        let dimension = validate_entries(&entries)?;

        if self.collection_exists().await? {
            return Err(Error::Store(format!(
                "Refusing to overwrite existing collection '{}'",
                self.collection
            )));
        }

        info!(
            "Creating collection {} with dimension {}",
            self.collection, dimension
        );
        let vectors_config = VectorParamsBuilder::new(dimension as u64, Distance::Cosine);
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(vectors_config),
            )
            .await?;

        let ingested_at = Utc::now().to_rfc3339();
        let points: Vec<PointStruct> = entries
            .into_iter()
            .map(|entry| ChunkPoint::from_entry(entry, &ingested_at).to_point_struct())
            .collect();

        let upserted = self.upsert_all(&points).await;
        discard_on_failure(upserted, move || async move {
            self.client
                .delete_collection(&self.collection)
                .await
                .map(|_| ())
                .map_err(Error::from)
        })
        .await?;

        info!("Collection {} created successfully", self.collection);
        Ok(())
    }

    async fn upsert_all(&self, points: &[PointStruct]) -> Result<()> {
        for batch in points.chunks(UPSERT_BATCH_SIZE) {
            debug!(
                "Upserting {} points to collection {}",
                batch.len(),
                self.collection
            );
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, batch.to_vec()).wait(true))
                .await?;
        }
        Ok(())
    }
}

/// Run `discard` when `result` failed, keeping the original error
async fn discard_on_failure<F, Fut>(result: Result<()>, discard: F) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let Err(e) = result else {
        return Ok(());
    };
    if let Err(cleanup) = discard().await {
        warn!("Failed to remove partially written collection: {}", cleanup);
    }
    Err(e)
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        debug!(
            "Searching collection {} with limit {}",
            self.collection, k
        );

        let search_builder = SearchPointsBuilder::new(&self.collection, query.to_vec(), k as u64)
            .with_payload(true);

        let response = self.client.search_points(search_builder).await?;

        response
            .result
            .into_iter()
            .map(|p| {
                let payload = p
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect::<serde_json::Map<String, Value>>();

                Ok(ScoredChunk {
                    chunk: ChunkPayload::try_from(payload)?.into_chunk(),
                    score: p.score,
                })
            })
            .collect()
    }

    async fn len(&self) -> Result<usize> {
        let info = self.client.collection_info(&self.collection).await?;

        let points_count = info
            .result
            .and_then(|r| r.points_count)
            .unwrap_or(0);

        Ok(points_count as usize)
    }

    fn location(&self) -> String {
        format!("{} (collection '{}')", self.url, self.collection)
    }
}
