//! Folder scan command.

use std::path::Path;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::extract::MetadataExtractor;
use crate::scanner;

/// Scan a directory and extract every audio file in it
pub fn cmd_scan(
    rt: &Runtime,
    config: &Config,
    path: &Path,
    concurrency: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }

    let concurrency = concurrency.unwrap_or(config.scan.concurrency);
    let extractor = MetadataExtractor::with_local_defaults(&config.cache);

    if !json {
        println!("Scanning directory: {}", path.display());
    }
    let summary = rt.block_on(scanner::scan_library(path, &extractor, concurrency));

    if json {
        println!("{}", serde_json::to_string_pretty(&summary.songs)?);
        return Ok(());
    }

    for song in summary.failures() {
        eprintln!(
            "FAILED {} ({})",
            song.path.display(),
            song.error_message.as_deref().unwrap_or("unknown")
        );
    }
    println!(
        "\nScan complete: {} files, {} extracted, {} failed.",
        summary.processed,
        summary.succeeded(),
        summary.failed
    );
    Ok(())
}
