use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::OutputConfig;

/// Name written into the provenance header of every generated file.
pub const GENERATOR_NAME: &str = "crankgen";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write generated file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes one generated file per rendered combination.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    extension: String,
    comment_prefix: String,
}

impl OutputWriter {
    pub fn new(cfg: &OutputConfig) -> Self {
        Self { extension: cfg.extension.clone(), comment_prefix: cfg.comment_prefix.clone() }
    }

    /// `<dir>/<stem>_<index>_gen<ext>` next to the source.
    pub fn output_path(&self, source: &Path, index: usize) -> PathBuf {
        let stem = source
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        source.with_file_name(format!("{stem}_{index}_gen{}", self.extension))
    }

    /// Provenance line placed at the top of each generated file.
    pub fn header(&self, source: &Path) -> String {
        let name = source
            .file_name()
            .map_or_else(|| source.display().to_string(), |n| n.to_string_lossy().into_owned());
        format!("{} GENERATED BY {GENERATOR_NAME} FROM {name} - DO NOT EDIT\n", self.comment_prefix)
    }

    /// Write `body` for combination `index` of `source`, returning the path written.
    pub fn write(&self, source: &Path, index: usize, body: &str) -> Result<PathBuf, OutputError> {
        let path = self.output_path(source, index);
        let mut content = self.header(source);
        content.push_str(body);

        fs::write(&path, content).map_err(|e| OutputError::Io { path: path.clone(), source: e })?;
        debug!(path = %path.display(), index, "wrote generated file");
        Ok(path)
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new(&OutputConfig::default())
    }
}
