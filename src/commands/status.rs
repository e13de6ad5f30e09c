//! Status command implementation

use crate::config::{Config, PipelineMode, StoreBackend};
use crate::error::Result;
use crate::store::{open_store, store_exists, store_location};
use serde::Serialize;
use tracing::{debug, info};

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub config_found: bool,
    pub backend: StoreBackend,
    pub store_location: String,
    pub store_reachable: bool,
    pub store_exists: bool,
    pub chunk_count: Option<usize>,
    pub data_dir: String,
    pub embedding_model: String,
    pub llm_model: String,
    pub pipeline_mode: PipelineMode,
}

/// Get system status
///
/// Store problems are reported in the result rather than returned as errors.
pub async fn cmd_status(config: &Config) -> Result<StatusInfo> {
    info!("Getting status");

    let (store_reachable, exists) = match store_exists(config).await {
        Ok(exists) => (true, exists),
        Err(e) => {
            debug!("Store check failed: {:?}", e);
            (false, false)
        }
    };

    let chunk_count = if exists {
        match open_store(config).await {
            Ok(store) => store.len().await.ok(),
            Err(e) => {
                debug!("Store open failed: {:?}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        config_found: config.paths.config_file.exists(),
        backend: config.store.backend,
        store_location: store_location(config),
        store_reachable,
        store_exists: exists,
        chunk_count,
        data_dir: config.data_dir(None).display().to_string(),
        embedding_model: config.embedding.model.clone(),
        llm_model: config.llm.model.clone(),
        pipeline_mode: config.pipeline.mode,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 jobsift Status\n");
    let config_note = if status.config_found {
        ""
    } else {
        " (not found, using defaults)"
    };
    println!("Configuration: {}{}", status.config_path, config_note);
    println!("Data directory: {}", status.data_dir);

    println!("\nVector store ({}):", status.backend);
    println!("  Location: {}", status.store_location);
    let store_status = if !status.store_reachable {
        "✗ Not reachable"
    } else if status.store_exists {
        "✓ Ready"
    } else {
        "⚠ Not created - run 'jobsift ingest' to create"
    };
    println!("  Status: {}", store_status);
    if let Some(count) = status.chunk_count {
        println!("  Chunks: {}", count);
    }

    println!("\nEmbedding model: {}", status.embedding_model);
    println!("Chat model: {}", status.llm_model);
    println!("Pipeline mode: {}", status.pipeline_mode);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::store::{create_store, StoreEntry};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_without_store() {
        let tmp = TempDir::new().unwrap();
        let config = Config::with_path(&tmp.path().join("jobsift.toml"));

        let status = cmd_status(&config).await.unwrap();
        assert!(!status.config_found);
        assert!(status.store_reachable);
        assert!(!status.store_exists);
        assert_eq!(status.chunk_count, None);
    }

    #[tokio::test]
    async fn test_status_counts_chunks() {
        let tmp = TempDir::new().unwrap();
        let config = Config::with_path(&tmp.path().join("jobsift.toml"));
        let entries = (0..3)
            .map(|i| StoreEntry {
                chunk: Chunk::new("job.txt", i, format!("chunk {}", i)),
                embedding: vec![1.0, i as f32],
            })
            .collect();
        create_store(&config, "model", entries).await.unwrap();

        let status = cmd_status(&config).await.unwrap();
        assert!(status.store_exists);
        assert_eq!(status.chunk_count, Some(3));
    }
}
