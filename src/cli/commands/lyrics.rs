//! Lyrics resolution command.

use std::path::Path;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::extract::MetadataExtractor;
use crate::lyrics::lrc;

/// Resolve the LRC file for an audio file and print its lines
pub fn cmd_lyrics(rt: &Runtime, config: &Config, path: &Path) -> anyhow::Result<()> {
    let extractor = MetadataExtractor::with_local_defaults(&config.cache);

    let Some(lrc_path) = rt.block_on(extractor.lyrics().resolve(path)) else {
        println!("No synchronized lyrics for {}", path.display());
        return Ok(());
    };

    println!("Lyrics: {}\n", lrc_path.display());
    let text = std::fs::read_to_string(&lrc_path)?;
    for line in lrc::parse(&text) {
        let secs = line.time.as_secs();
        println!(
            "{:>3}:{:02}.{:02}  {}",
            secs / 60,
            secs % 60,
            line.time.subsec_millis() / 10,
            line.text
        );
    }
    Ok(())
}
