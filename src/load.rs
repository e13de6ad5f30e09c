//! Document loading from a directory of plain-text files

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A loaded source document
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Originating file, used as the chunk source identifier
    pub source: String,

    /// Full file contents
    pub text: String,
}

/// Find files under `dir` matching the configured extensions, sorted by path
pub fn find_documents(dir: &Path, config: &IngestConfig) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "Data directory not found: {}",
            dir.display()
        )));
    }

    let max_depth = if config.recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).max_depth(max_depth).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::InvalidPath(e.to_string()))?;
        if entry.file_type().is_file() && has_extension(entry.path(), &config.extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Load every matching document in `dir`
pub fn load_documents(dir: &Path, config: &IngestConfig) -> Result<Vec<SourceDocument>> {
    find_documents(dir, config)?
        .into_iter()
        .map(|path| {
            debug!("Loading {}", path.display());
            let text = std::fs::read_to_string(&path)?;
            Ok(SourceDocument {
                source: path.display().to_string(),
                text,
            })
        })
        .collect()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
