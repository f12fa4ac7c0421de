use crankgen_core::config::ResolvedConfig;
use std::fs::File;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install the stderr layer and, when configured, a file layer.
///
/// The returned guard flushes the file writer when dropped; hold it until
/// the run is over.
pub fn init(cfg: &ResolvedConfig) -> Result<Option<WorkerGuard>, std::io::Error> {
    let stderr_level = parse_level(&cfg.logging.level).unwrap_or(LevelFilter::WARN);

    let stderr_filter =
        EnvFilter::builder().with_default_directive(stderr_level.into()).from_env_lossy();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_filter(stderr_filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let Some(ref path) = cfg.logging.file else {
        registry.init();
        return Ok(None);
    };

    let file_level = cfg
        .logging
        .file_level
        .as_deref()
        .and_then(parse_level)
        .unwrap_or(LevelFilter::DEBUG);
    let file_filter =
        EnvFilter::builder().with_default_directive(file_level.into()).from_env_lossy();

    let file = File::create(path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(file_filter);

    registry.with(file_layer).init();
    Ok(Some(guard))
}

fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.to_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}
