use std::path::PathBuf;

use serde::Deserialize;

/// On-disk shape of `crankgen.toml`.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for generated files.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Extension of generated files, including the leading dot.
    #[serde(default = "default_output_extension")]
    pub extension: String,
    /// Line-comment marker used for the provenance header.
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: default_output_extension(),
            comment_prefix: default_comment_prefix(),
        }
    }
}

fn default_output_extension() -> String {
    ".crank".to_string()
}

fn default_comment_prefix() -> String {
    ";".to_string()
}

/// Settings for locating sources when a directory is passed on the command line.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SourcesConfig {
    /// Extension (without the dot) that marks a crank source.
    #[serde(default = "default_source_extension")]
    pub extension: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self { extension: default_source_extension() }
    }
}

fn default_source_extension() -> String {
    "crankgen".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Configuration after validation and path expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Where the settings came from; `None` when running on defaults.
    pub source: Option<PathBuf>,
    pub output: OutputConfig,
    pub sources: SourcesConfig,
    pub logging: LoggingConfig,
}
