//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `scan`: Folder scanning
//! - `extract`: Single-file metadata extraction
//! - `lyrics`: Synchronized lyrics resolution
//! - `artist`: MusicBrainz artist lookup
//! - `config`: Effective configuration

mod artist;
mod config;
mod extract;
mod lyrics;
mod scan;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

pub use artist::cmd_artist;
pub use config::cmd_config;
pub use extract::cmd_extract;
pub use lyrics::cmd_lyrics;
pub use scan::cmd_scan;

/// Music Ingest CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "MUSIC_INGEST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Extract metadata from every audio file under a directory
    Scan {
        /// Path to the directory to scan
        path: PathBuf,
        /// Files extracted at once (defaults to the configured value)
        #[arg(short, long)]
        concurrency: Option<usize>,
        /// Print every record as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Extract metadata from one audio file and print it as JSON
    Extract {
        /// Path to the audio file
        path: PathBuf,
    },
    /// Resolve synchronized lyrics for an audio file
    Lyrics {
        /// Path to the audio file
        path: PathBuf,
    },
    /// Look up an artist on MusicBrainz (Ctrl+C cancels)
    Artist {
        /// Artist name to search for
        name: String,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => crate::config::load_from(path),
        None => crate::config::load(),
    };
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Scan {
            path,
            concurrency,
            json,
        } => cmd_scan(&rt, &config, path, *concurrency, *json),
        Commands::Extract { path } => cmd_extract(&rt, &config, path),
        Commands::Lyrics { path } => cmd_lyrics(&rt, &config, path),
        Commands::Artist { name } => cmd_artist(&rt, &config, name),
        Commands::Config { write } => cmd_config(&config, cli.config.as_deref(), *write),
    }
}
