use crate::config::types::{ConfigFile, LoggingConfig, OutputConfig, ResolvedConfig};
use shellexpand::full;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    NotFound(String),

    #[error("failed to read config file {0}: {1}")]
    ReadError(String, #[source] std::io::Error),

    #[error("failed to parse TOML in {0}: {1}")]
    ParseError(String, #[source] toml::de::Error),

    #[error("version {0} is unsupported (expected 1)")]
    BadVersion(u32),

    #[error("invalid output extension '{0}': {1}")]
    BadExtension(String, &'static str),

    #[error("home directory not available to expand '~'")]
    NoHome,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from `config_path`, or fall back to the built-in defaults.
    ///
    /// No file is looked up implicitly: without an explicit path the tool
    /// behaves identically on every machine.
    pub fn load(config_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
        let Some(path) = config_path else {
            return Ok(ResolvedConfig::default());
        };

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let s = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.display().to_string(), e))?;

        let cf: ConfigFile = toml::from_str(&s)
            .map_err(|e| ConfigError::ParseError(path.display().to_string(), e))?;

        if cf.version != 1 {
            return Err(ConfigError::BadVersion(cf.version));
        }

        validate_output(&cf.output, &cf.sources.extension)?;

        // Resolve log file path if present
        let logging = if let Some(ref file) = cf.logging.file {
            LoggingConfig {
                level: cf.logging.level.clone(),
                file_level: cf.logging.file_level.clone(),
                file: Some(expand_path(&file.to_string_lossy())?),
            }
        } else {
            cf.logging.clone()
        };

        Ok(ResolvedConfig {
            source: Some(path.to_path_buf()),
            output: cf.output,
            sources: cf.sources,
            logging,
        })
    }
}

fn validate_output(output: &OutputConfig, source_ext: &str) -> Result<(), ConfigError> {
    let ext = &output.extension;
    if !ext.starts_with('.') || ext.len() < 2 {
        return Err(ConfigError::BadExtension(ext.clone(), "must start with '.'"));
    }
    if ext.contains(['/', '\\']) {
        return Err(ConfigError::BadExtension(ext.clone(), "must not contain a path separator"));
    }
    if ext[1..] == *source_ext {
        return Err(ConfigError::BadExtension(
            ext.clone(),
            "must differ from the source extension",
        ));
    }
    Ok(())
}

fn expand_path(input: &str) -> Result<PathBuf, ConfigError> {
    let expanded = full(input).map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(expanded.to_string()))
}
