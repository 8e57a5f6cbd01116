//! Command-line interface for music-ingest.
//!
//! This module provides CLI commands for scanning folders, extracting a
//! single file's metadata, resolving lyrics and looking up artists.

mod commands;

pub use commands::{Cli, Commands, run_command};
