use crankgen_core::config::{ConfigLoader, ResolvedConfig};
use crankgen_core::generator::Generator;
use crankgen_core::sources::expand_sources;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

use crate::logging;

pub fn run(config: Option<&Path>, args: &[PathBuf]) -> ExitCode {
    let cfg = match ConfigLoader::load(config) {
        Ok(rc) => rc,
        Err(e) => return fail(None, &e),
    };
    let _log_guard = match logging::init(&cfg) {
        Ok(guard) => guard,
        Err(e) => {
            let path = cfg.logging.file.as_deref().unwrap_or(Path::new(""));
            return fail(None, &format!("failed to create log file {}: {e}", path.display()));
        }
    };
    debug!(config = ?cfg.source, "configuration loaded");

    let sources = match expand_sources(args, &cfg.sources) {
        Ok(s) => s,
        Err(e) => return fail(None, &e),
    };
    let generator = match Generator::new(&cfg) {
        Ok(g) => g,
        Err(e) => return fail(None, &e),
    };

    run_sources(&cfg, &generator, &sources)
}

/// Process sources in order, stopping the whole run on the first failure.
fn run_sources(cfg: &ResolvedConfig, generator: &Generator, sources: &[PathBuf]) -> ExitCode {
    let mut total = 0;
    for path in sources {
        match generator.generate_file(path) {
            Ok(report) => total += report.written.len(),
            Err(e) => return fail(Some(path), &e),
        }
    }
    info!(sources = sources.len(), files = total, extension = %cfg.output.extension, "done");
    ExitCode::SUCCESS
}

fn fail(source: Option<&Path>, err: &dyn Display) -> ExitCode {
    match source {
        Some(path) => eprintln!("FAIL crankgen {}", path.display()),
        None => eprintln!("FAIL crankgen"),
    }
    eprintln!("{err}");
    ExitCode::FAILURE
}
