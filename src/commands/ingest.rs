//! Ingest command implementation
//!
//! Load text files, split them into chunks, embed the chunks and write a new
//! vector store. An existing store is never touched: ingestion is skipped.

use crate::chunk::{chunk_documents, RecursiveSplitter};
use crate::config::Config;
use crate::embed::{create_embedder, embed_in_batches, Embedder};
use crate::error::Result;
use crate::load::load_documents;
use crate::store::{create_store, store_exists, store_location, StoreEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Statistics from a completed ingestion run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestStats {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub location: String,
}

/// What an ingestion run did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// A store was already present; nothing was written
    StoreExists { location: String },
    /// No usable documents were found; no store was created
    NoDocuments { data_dir: PathBuf },
    Completed(IngestStats),
}

/// Ingest documents into the configured store
pub async fn cmd_ingest(config: &Config, data_dir: Option<&Path>) -> Result<IngestOutcome> {
    // Checked before building the embedder so a skip needs no credentials
    if store_exists(config).await? {
        let location = store_location(config);
        info!("Vector store already exists at {}. Skipping ingestion.", location);
        return Ok(IngestOutcome::StoreExists { location });
    }

    let embedder = create_embedder(config)?;
    let data_dir = config.data_dir(data_dir);
    ingest_with(config, &data_dir, embedder.as_ref()).await
}

/// Run the full ingestion pipeline with a given embedder
pub async fn ingest_with(
    config: &Config,
    data_dir: &Path,
    embedder: &dyn Embedder,
) -> Result<IngestOutcome> {
    let location = store_location(config);
    if store_exists(config).await? {
        info!("Vector store already exists at {}. Skipping ingestion.", location);
        return Ok(IngestOutcome::StoreExists { location });
    }

    info!("Loading documents from {}...", data_dir.display());
    let documents = load_documents(data_dir, &config.ingest)?;
    if documents.is_empty() {
        warn!("No documents found in the data directory. Exiting.");
        return Ok(IngestOutcome::NoDocuments {
            data_dir: data_dir.to_path_buf(),
        });
    }
    info!("Loaded {} documents.", documents.len());

    info!("Splitting documents into chunks...");
    let splitter = RecursiveSplitter::from_config(&config.chunk);
    let chunks = chunk_documents(&documents, &splitter);
    if chunks.is_empty() {
        warn!("Documents contain no text to index. Exiting.");
        return Ok(IngestOutcome::NoDocuments {
            data_dir: data_dir.to_path_buf(),
        });
    }
    info!("Split documents into {} chunks.", chunks.len());

    info!(
        "Creating vector store with {} embeddings...",
        embedder.model_name()
    );
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embed_in_batches(embedder, texts, config.embedding.batch_size).await?;
    let dimension = embeddings.first().map(Vec::len).unwrap_or(0);

    let entries: Vec<StoreEntry> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| StoreEntry { chunk, embedding })
        .collect();
    let chunk_count = entries.len();

    create_store(config, embedder.model_name(), entries).await?;
    info!("Vector store saved to {}. Ingestion complete.", location);

    Ok(IngestOutcome::Completed(IngestStats {
        documents: documents.len(),
        chunks: chunk_count,
        dimension,
        location,
    }))
}

/// Print an ingestion outcome to console
pub fn print_ingest_outcome(outcome: &IngestOutcome) {
    match outcome {
        IngestOutcome::StoreExists { location } => {
            println!("Vector store already exists at {}; nothing to do.", location);
            println!("Delete it to rebuild from scratch.");
        }
        IngestOutcome::NoDocuments { data_dir } => {
            println!("No documents found in {}; no store created.", data_dir.display());
        }
        IngestOutcome::Completed(stats) => {
            println!("\n✓ Ingestion complete\n");
            println!("  Documents: {}", stats.documents);
            println!("  Chunks:    {}", stats.chunks);
            println!("  Dimension: {}", stats.dimension);
            println!("  Store:     {}", stats.location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pipeline::QaPipeline;
    use crate::store::{open_store, LocalStore};
    use crate::testing::{HashingEmbedder, ScriptedChat};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir) -> Config {
        Config::with_path(&tmp.path().join("jobsift.toml"))
    }

    fn write_doc(dir: &Path, name: &str, text: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), text).unwrap();
    }

    #[tokio::test]
    async fn test_existing_store_is_skipped_without_writes() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let store_dir = config.store_path();
        std::fs::create_dir_all(&store_dir).unwrap();
        std::fs::write(store_dir.join("marker"), "keep").unwrap();

        let data = tmp.path().join("data");
        write_doc(&data, "job.txt", "Some job text.");

        let embedder = HashingEmbedder::default();
        let outcome = ingest_with(&config, &data, &embedder).await.unwrap();

        assert!(matches!(outcome, IngestOutcome::StoreExists { .. }));
        assert_eq!(embedder.calls(), 0);
        let names: Vec<_> = std::fs::read_dir(&store_dir).unwrap().collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_cmd_ingest_skips_without_credentials() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_in(&tmp);
        config.openai.api_key_env = "JOBSIFT_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        std::fs::create_dir_all(config.store_path()).unwrap();

        let outcome = cmd_ingest(&config, None).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::StoreExists { .. }));
    }

    #[tokio::test]
    async fn test_empty_data_dir_creates_no_store() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let data = tmp.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("notes.md"), "not a txt file").unwrap();

        let embedder = HashingEmbedder::default();
        let outcome = ingest_with(&config, &data, &embedder).await.unwrap();

        assert_eq!(outcome, IngestOutcome::NoDocuments { data_dir: data });
        assert!(!LocalStore::exists(&config.store_path()));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_only_documents_create_no_store() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let data = tmp.path().join("data");
        write_doc(&data, "blank.txt", "  \n\n \t ");

        let outcome = ingest_with(&config, &data, &HashingEmbedder::default())
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::NoDocuments { .. }));
        assert!(!LocalStore::exists(&config.store_path()));
    }

    #[tokio::test]
    async fn test_missing_data_dir_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);

        let err = ingest_with(&config, &tmp.path().join("absent"), &HashingEmbedder::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_ingest_then_ask_returns_stored_chunk() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let data = tmp.path().join("data");
        let text = "Data Scientist requires Python, SQL, and statistics.";
        write_doc(&data, "data_scientist.txt", text);

        let embedder = Arc::new(HashingEmbedder::default());
        let outcome = ingest_with(&config, &data, embedder.as_ref()).await.unwrap();
        let stats = match outcome {
            IngestOutcome::Completed(stats) => stats,
            other => panic!("expected completed ingestion, got {other:?}"),
        };
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.chunks, 1);
        assert_eq!(stats.dimension, embedder.dimension());

        let chat = Arc::new(ScriptedChat::new([
            "1. data scientist skills\n2. data scientist requirements",
            "A data scientist needs Python, SQL, and statistics.",
        ]));
        let store = open_store(&config).await.unwrap();
        let pipeline = QaPipeline::new(embedder, chat, store, config.pipeline.clone());

        let result = pipeline
            .ask("What skills are needed for a data scientist?")
            .await
            .unwrap();

        assert!(result.answer.contains("Python"));
        assert!(result.answer.contains("SQL"));
        assert!(result.answer.contains("statistics"));
        assert_eq!(result.context.len(), 1);
        assert_eq!(result.context[0].chunk.text, text);
        assert!(result.context[0]
            .chunk
            .metadata
            .source
            .ends_with("data_scientist.txt"));
    }
}
