//! File-backed vector store
//!
//! Layout of a store directory:
//! - `manifest.json`: format version, embedding model, dimension, entry count
//! - `entries.jsonl`: one [`StoreEntry`] per line
//!
//! The directory is staged next to its final location and renamed into place,
//! so a store either exists completely or not at all.

use super::{cosine_similarity, ScoredChunk, StoreEntry, VectorStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const MANIFEST_FILE: &str = "manifest.json";
const ENTRIES_FILE: &str = "entries.jsonl";
const FORMAT_VERSION: u32 = 1;

/// Metadata describing a persisted store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreManifest {
    pub format_version: u32,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

/// In-memory view of a store directory
pub struct LocalStore {
    root: PathBuf,
    manifest: StoreManifest,
    entries: Vec<StoreEntry>,
}

impl LocalStore {
    /// Whether a store exists at `path`
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Persist `entries` as a new store at `path`
    pub fn create(path: &Path, model: &str, entries: Vec<StoreEntry>) -> Result<Self> {
        if path.exists() {
            return Err(Error::Store(format!(
                "Refusing to overwrite existing store at {}",
                path.display()
            )));
        }

        let dimension = validate_entries(&entries)?;
        let manifest = StoreManifest {
            format_version: FORMAT_VERSION,
            embedding_model: model.to_string(),
            dimension,
            chunk_count: entries.len(),
            created_at: Utc::now(),
        };

        let staging = staging_path(path)?;
        debug!("Staging store at {:?}", staging);

        if let Err(e) = write_store(&staging, &manifest, &entries) {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!("Failed to remove staging directory {:?}: {}", staging, cleanup);
            }
            return Err(e);
        }

        fs::rename(&staging, path)?;
        info!(
            "Wrote {} chunks ({} dimensions) to {}",
            manifest.chunk_count,
            manifest.dimension,
            path.display()
        );

        Ok(Self {
            root: path.to_path_buf(),
            manifest,
            entries,
        })
    }

    /// Load an existing store into memory
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(Error::Store(format!(
                "No vector store at {}; run `jobsift ingest` first",
                path.display()
            )));
        }

        let manifest_file = File::open(path.join(MANIFEST_FILE))?;
        let manifest: StoreManifest = serde_json::from_reader(BufReader::new(manifest_file))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::Store(format!(
                "Unsupported store format version {} at {}",
                manifest.format_version,
                path.display()
            )));
        }

        let reader = BufReader::new(File::open(path.join(ENTRIES_FILE))?);
        let mut entries = Vec::with_capacity(manifest.chunk_count);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str::<StoreEntry>(&line)?);
        }

        if entries.len() != manifest.chunk_count {
            return Err(Error::Store(format!(
                "Store at {} is incomplete: manifest lists {} chunks, found {}",
                path.display(),
                manifest.chunk_count,
                entries.len()
            )));
        }
        if let Some(bad) = entries
            .iter()
            .find(|e| e.embedding.len() != manifest.dimension)
        {
            return Err(Error::Store(format!(
                "Chunk {} has {} dimensions, store expects {}",
                bad.chunk.id,
                bad.embedding.len(),
                manifest.dimension
            )));
        }

        debug!("Opened store at {:?} with {} chunks", path, entries.len());
        Ok(Self {
            root: path.to_path_buf(),
            manifest,
            entries,
        })
    }

    pub fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    /// Rank all entries by cosine similarity; ties keep insertion order
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.manifest.dimension {
            return Err(Error::Store(format!(
                "Query has {} dimensions, store at {} expects {} (embedded with '{}')",
                query.len(),
                self.root.display(),
                self.manifest.dimension,
                self.manifest.embedding_model
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }
}

#[async_trait]
impl VectorStore for LocalStore {
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        self.nearest(query, k)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

pub(super) fn validate_entries(entries: &[StoreEntry]) -> Result<usize> {
    let first = entries
        .first()
        .ok_or_else(|| Error::Store("Refusing to create an empty store".to_string()))?;
    let dimension = first.embedding.len();
    if dimension == 0 {
        return Err(Error::Store("Embeddings must not be empty".to_string()));
    }
    if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
        return Err(Error::Store(format!(
            "Vector dimension mismatch: expected {}, chunk {} has {}",
            dimension,
            bad.chunk.id,
            bad.embedding.len()
        )));
    }
    Ok(dimension)
}

fn staging_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::InvalidPath(format!("{}: not a directory name", path.display())))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    Ok(parent.join(format!(
        ".{}.staging-{}",
        name.to_string_lossy(),
        Uuid::new_v4()
    )))
}

fn write_store(dir: &Path, manifest: &StoreManifest, entries: &[StoreEntry]) -> Result<()> {
    fs::create_dir_all(dir)?;

    let mut manifest_writer = BufWriter::new(File::create(dir.join(MANIFEST_FILE))?);
    serde_json::to_writer_pretty(&mut manifest_writer, manifest)?;
    manifest_writer.flush()?;

    let mut entries_writer = BufWriter::new(File::create(dir.join(ENTRIES_FILE))?);
    for entry in entries {
        serde_json::to_writer(&mut entries_writer, entry)?;
        entries_writer.write_all(b"\n")?;
    }
    entries_writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use tempfile::TempDir;

    fn entry(source: &str, text: &str, embedding: Vec<f32>) -> StoreEntry {
        StoreEntry {
            chunk: Chunk::new(source, 0, text.to_string()),
            embedding,
        }
    }

    #[test]
    fn test_create_and_open() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");

        LocalStore::create(&path, "model-a", vec![entry("a.txt", "alpha", vec![1.0, 0.0])])
            .unwrap();
        assert!(LocalStore::exists(&path));

        let store = LocalStore::open(&path).unwrap();
        assert_eq!(store.manifest().embedding_model, "model-a");
        assert_eq!(store.manifest().dimension, 2);
        assert_eq!(store.manifest().chunk_count, 1);
    }

    #[test]
    fn test_nearest_returns_sorted_top_k() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");
        LocalStore::create(
            &path,
            "m",
            vec![
                entry("far.txt", "far away", vec![0.0, 1.0, 0.0]),
                entry("close.txt", "very close", vec![1.0, 0.0, 0.0]),
                entry("mid.txt", "medium", vec![0.5, 0.5, 0.0]),
            ],
        )
        .unwrap();

        let store = LocalStore::open(&path).unwrap();
        let results = store.nearest(&[1.0, 0.0, 0.0], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.metadata.source, "close.txt");
        assert_eq!(results[1].chunk.metadata.source, "mid.txt");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");
        LocalStore::create(
            &path,
            "m",
            vec![
                entry("first.txt", "one", vec![1.0, 0.0]),
                entry("second.txt", "two", vec![1.0, 0.0]),
            ],
        )
        .unwrap();

        let results = LocalStore::open(&path).unwrap().nearest(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.metadata.source, "first.txt");
        assert_eq!(results[1].chunk.metadata.source, "second.txt");
    }

    #[test]
    fn test_nan_scores_keep_a_consistent_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");
        LocalStore::create(
            &path,
            "m",
            vec![
                entry("first.txt", "one", vec![1.0, 0.0]),
                entry("zero.txt", "none", vec![0.0, 0.0]),
                entry("third.txt", "three", vec![0.0, 1.0]),
            ],
        )
        .unwrap();
        let store = LocalStore::open(&path).unwrap();

        let results = store.nearest(&[f32::NAN, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        let sources: Vec<_> = results.iter().map(|r| r.chunk.metadata.source.as_str()).collect();
        assert!(sources.contains(&"first.txt"));
        assert!(sources.contains(&"third.txt"));
        // first and third both score NaN and tie
        let first = sources.iter().position(|s| *s == "first.txt").unwrap();
        let third = sources.iter().position(|s| *s == "third.txt").unwrap();
        assert!(first < third);

        let results = store.nearest(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results[0].chunk.metadata.source, "first.txt");
        assert_eq!(results[1].chunk.metadata.source, "zero.txt");
        assert_eq!(results[2].chunk.metadata.source, "third.txt");
    }

    #[test]
    fn test_text_round_trips_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");
        let text = "Ünïcode \"quotes\"\ttabs\nnewlines and trailing spaces   ";
        LocalStore::create(&path, "m", vec![entry("a.txt", text, vec![0.3, 0.4])]).unwrap();

        let results = LocalStore::open(&path).unwrap().nearest(&[0.3, 0.4], 1).unwrap();
        assert_eq!(results[0].chunk.text.as_bytes(), text.as_bytes());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");
        LocalStore::create(&path, "m", vec![entry("a.txt", "a", vec![1.0])]).unwrap();

        let err = LocalStore::create(&path, "m", vec![entry("b.txt", "b", vec![1.0])]);
        assert!(matches!(err, Err(Error::Store(_))));
    }

    #[test]
    fn test_failed_create_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");

        let err = LocalStore::create(
            &path,
            "m",
            vec![entry("a.txt", "a", vec![1.0, 0.0]), entry("b.txt", "b", vec![1.0])],
        );

        assert!(matches!(err, Err(Error::Store(_))));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_entries_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");
        assert!(LocalStore::create(&path, "m", Vec::new()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_open_missing_store() {
        let tmp = TempDir::new().unwrap();
        match LocalStore::open(&tmp.path().join("missing")) {
            Err(Error::Store(message)) => assert!(message.contains("ingest")),
            other => panic!("expected store error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store");
        LocalStore::create(&path, "m", vec![entry("a.txt", "a", vec![1.0, 0.0])]).unwrap();

        let store = LocalStore::open(&path).unwrap();
        assert!(matches!(store.nearest(&[1.0], 1), Err(Error::Store(_))));
    }
}
