//! Résout un identifiant Spotify et affiche le résultat
//!
//! Usage:
//! ```bash
//! RUST_LOG=pmospotify=debug cargo run --example resolve -- spotify:album:4aawyAB9vmqN3uQ7FjRGTy
//! cargo run --example resolve -- "search:daft punk"
//! ```
//!
//! Les credentials sont lus depuis `accounts.spotify` dans la configuration.

use pmoconfig::Config;
use pmospotify::{LoadedItem, SessionSettings, SourceOptions, SpotifySession, SpotifySource};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let identifier = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: resolve <spotify uri | url | search:... | similar:...>"))?;

    let config = Config::load_config("")?;
    let session = SpotifySession::connect_with_settings(SessionSettings::from_config(&config)?).await?;
    let source = SpotifySource::new(session, SourceOptions::from_config(&config)?);

    match source.load_item(&identifier).await {
        Ok(LoadedItem::Track(track)) => {
            println!("{} - {} ({} ms)", track.author, track.title, track.length_ms);
            println!("  {}", track.uri);
        }
        Ok(LoadedItem::Playlist(playlist)) => {
            println!("=== {} ({} pistes) ===", playlist.name, playlist.tracks.len());
            for (i, track) in playlist.tracks.iter().enumerate() {
                println!("  {:>3}. {} - {}", i + 1, track.author, track.title);
            }
        }
        Ok(LoadedItem::NoTrack) => println!("Aucun résultat"),
        Err(e) => eprintln!("✗ {} ({:?})", e.message, e.severity),
    }

    source.shutdown().await;
    Ok(())
}
