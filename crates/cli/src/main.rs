mod cmd;
mod logging;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "crankgen",
    version,
    about = "Expand crank sources into one generated file per combination"
)]
struct Cli {
    /// Optional crankgen.toml; built-in defaults apply without it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Source files, or directories searched recursively for sources
    #[arg(required = true, value_name = "SOURCE")]
    sources: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cmd::generate::run(cli.config.as_deref(), &cli.sources)
}
