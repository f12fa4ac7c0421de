//! Optional `crankgen.toml` settings.

pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{LoggingConfig, OutputConfig, ResolvedConfig, SourcesConfig};
