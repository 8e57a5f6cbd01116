//! Music Ingest - command-line front end.
//!
//! Scans folders and single files for audio metadata, resolves synchronized
//! lyrics and looks up artists. Run with `--help` for the command list.

use clap::Parser;
use music_ingest::cli;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("music_ingest=info".parse()?))
        .init();

    cli::run_command(&args)
}
