use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::SourcesConfig;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("source path does not exist: {0}")]
    Missing(String),

    #[error("failed to read source directory {0} : {1}")]
    WalkError(String, #[source] walkdir::Error),
}

/// Expand command-line arguments into the list of sources to process.
///
/// Files are kept as given, whatever their extension. Directories are
/// searched recursively for files carrying the configured source extension,
/// sorted by path. Argument order is preserved.
pub fn expand_sources(
    args: &[PathBuf],
    cfg: &SourcesConfig,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut out = Vec::new();
    for arg in args {
        if arg.is_dir() {
            out.extend(discover_sources(arg, cfg)?);
        } else if arg.exists() {
            out.push(arg.clone());
        } else {
            return Err(DiscoveryError::Missing(arg.display().to_string()));
        }
    }
    Ok(out)
}

/// All source files under `root`, sorted.
pub fn discover_sources(root: &Path, cfg: &SourcesConfig) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| DiscoveryError::WalkError(root.display().to_string(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_source_file(path, &cfg.extension) {
            found.push(path.to_path_buf());
        }
    }
    if found.is_empty() {
        warn!(dir = %root.display(), extension = %cfg.extension, "no sources found");
    }
    Ok(found)
}

fn is_source_file(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
}
