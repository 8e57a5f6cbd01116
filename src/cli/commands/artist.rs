//! Artist lookup command.

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::resolver::{ArtistResolver, MusicBrainzClient, ResolverError};

/// Look up an artist on MusicBrainz
pub fn cmd_artist(rt: &Runtime, config: &Config, name: &str) -> anyhow::Result<()> {
    let client = MusicBrainzClient::with_base_url(&config.resolver.base_url)?;
    let resolver = ArtistResolver::new(client, &config.resolver);
    let cancel = CancellationToken::new();

    let on_ctrl_c = cancel.clone();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl+C received, cancelling lookup");
            on_ctrl_c.cancel();
        }
    });

    match rt.block_on(resolver.resolve(name, &cancel)) {
        Ok(Some(artist)) => {
            println!("{} ({})", artist.name, artist.id);
            println!("Score: {}", artist.score);
        }
        Ok(None) if resolver.is_disabled() => println!("Artist lookups are disabled."),
        Ok(None) => println!("No confident match for {name:?}"),
        Err(ResolverError::Cancelled) => eprintln!("Lookup cancelled."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
