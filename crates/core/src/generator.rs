//! Drives one source from header parsing to written files.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::combinations::{Combination, combination_count, combinations};
use crate::config::ResolvedConfig;
use crate::directives::{CrankSource, DirectiveError, load_source};
use crate::expr::{DerivedExpressionError, inject_helpers, resolve_derived};
use crate::output::{OutputError, OutputWriter};
use crate::templates::{TemplateRenderError, TemplateRenderer};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Parse(#[from] DirectiveError),

    #[error("{source}")]
    Derived {
        file: String,
        #[source]
        source: DerivedExpressionError,
    },

    #[error("{source}\nlocals: {bindings}\nfile: {file}\nindex: {index}")]
    Render {
        file: String,
        index: usize,
        bindings: String,
        #[source]
        source: TemplateRenderError,
    },

    #[error(transparent)]
    Write(#[from] OutputError),

    #[error("{file}: too many combinations to enumerate")]
    TooManyCombinations { file: String },

    #[error("failed to build template renderer: {0}")]
    Renderer(#[source] TemplateRenderError),
}

/// What a successful run over one source produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub source: PathBuf,
    pub combinations: usize,
    /// Generated files in combination order.
    pub written: Vec<PathBuf>,
}

pub struct Generator {
    renderer: TemplateRenderer,
    writer: OutputWriter,
}

impl Generator {
    pub fn new(cfg: &ResolvedConfig) -> Result<Self, GenerateError> {
        let renderer = TemplateRenderer::new().map_err(GenerateError::Renderer)?;
        Ok(Self { renderer, writer: OutputWriter::new(&cfg.output) })
    }

    /// Read, parse and expand the source at `path`.
    pub fn generate_file(&self, path: &Path) -> Result<GenerationReport, GenerateError> {
        let source = load_source(path)?;
        self.generate(&source)
    }

    /// Expand an already parsed source.
    ///
    /// Derived expressions are evaluated for every combination before any
    /// file is written, so a failing expression leaves nothing behind for
    /// this source. A placeholder failure stops at the offending
    /// combination; earlier files stay on disk.
    pub fn generate(&self, source: &CrankSource) -> Result<GenerationReport, GenerateError> {
        let file = source.file_name();
        if combination_count(&source.variables).is_none() {
            return Err(GenerateError::TooManyCombinations { file });
        }

        let mut combos = combinations(&source.variables);
        for combo in &mut combos {
            evaluate_combination(combo, source)
                .map_err(|e| GenerateError::Derived { file: file.clone(), source: e })?;
        }
        debug!(file = %file, combinations = combos.len(), "evaluated derived expressions");

        let mut written = Vec::with_capacity(combos.len());
        for combo in &combos {
            let body = self
                .renderer
                .render_from(&source.template, source.template_line, &combo.bindings)
                .map_err(|e| GenerateError::Render {
                    file: file.clone(),
                    index: combo.index,
                    bindings: combo.bindings.to_string(),
                    source: e,
                })?;
            written.push(self.writer.write(&source.path, combo.index, &body)?);
        }

        info!(file = %file, files = written.len(), "generated");
        Ok(GenerationReport { source: source.path.clone(), combinations: combos.len(), written })
    }
}

fn evaluate_combination(
    combo: &mut Combination,
    source: &CrankSource,
) -> Result<(), DerivedExpressionError> {
    inject_helpers(&mut combo.bindings);
    resolve_derived(&mut combo.bindings, &source.derived)
}
