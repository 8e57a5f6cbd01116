//! Single-file extraction command.

use std::path::Path;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::extract::MetadataExtractor;

/// Extract one file and print the record as JSON
pub fn cmd_extract(rt: &Runtime, config: &Config, path: &Path) -> anyhow::Result<()> {
    let extractor = MetadataExtractor::with_local_defaults(&config.cache);
    let song = rt.block_on(extractor.extract_metadata(path));

    println!("{}", serde_json::to_string_pretty(&song)?);
    if song.extraction_failed {
        anyhow::bail!(
            "Extraction failed: {}",
            song.error_message.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}
