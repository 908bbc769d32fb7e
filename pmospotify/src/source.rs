//! Source Spotify : point d'entrée du pipeline de lecture
//!
//! [`SpotifySource`] relie l'analyse des identifiants ([`crate::uri`]), les
//! résolveurs ([`crate::resolver`]) et l'adaptateur de lecture
//! ([`SpotifyAudioTrack`]) autour d'une [`SpotifySession`] injectée.
//!
//! # Examples
//!
//! ```no_run
//! use pmoconfig::Config;
//! use pmospotify::{LoadedItem, SessionSettings, SourceOptions, SpotifySession, SpotifySource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_config("")?;
//!     let session = SpotifySession::connect_with_settings(SessionSettings::from_config(&config)?).await?;
//!     let source = SpotifySource::new(session, SourceOptions::from_config(&config)?);
//!
//!     match source.load_item("spotify:album:4aawyAB9vmqN3uQ7FjRGTy").await? {
//!         LoadedItem::Playlist(album) => println!("{} tracks", album.tracks.len()),
//!         LoadedItem::Track(track) => println!("{}", track.title),
//!         LoadedItem::NoTrack => println!("nothing found"),
//!     }
//!
//!     source.shutdown().await;
//!     Ok(())
//! }
//! ```

use crate::error::{ResolveError, Result};
use crate::models::{DEFAULT_IMAGE_CDN, LoadedItem, TrackDescriptor};
use crate::quality::AudioQuality;
use crate::resolver::Resolver;
use crate::session::SpotifySession;
use crate::track::SpotifyAudioTrack;
use crate::uri;
use tracing::info;

/// Nom de la source
pub const SOURCE_NAME: &str = "spotify";

/// Options de chargement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Autorise le préfixe `search:`
    pub allow_search: bool,
    /// Pages de continuation des playlists, 0 = illimité
    pub playlist_load_limit: usize,
    pub preferred_quality: AudioQuality,
    pub image_cdn: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            allow_search: true,
            playlist_load_limit: 6,
            preferred_quality: AudioQuality::Normal,
            image_cdn: DEFAULT_IMAGE_CDN.to_string(),
        }
    }
}

/// Source Spotify
#[derive(Clone)]
pub struct SpotifySource {
    resolver: Resolver,
    options: SourceOptions,
}

impl SpotifySource {
    pub fn new(session: SpotifySession, options: SourceOptions) -> Self {
        let resolver = Resolver::new(session, options.image_cdn.clone(), options.playlist_load_limit);
        Self { resolver, options }
    }

    pub fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    pub fn session(&self) -> &SpotifySession {
        self.resolver.session()
    }

    /// Charge un identifiant : URI, URL, `search:` ou `similar:`
    pub async fn load_item(&self, identifier: &str) -> std::result::Result<LoadedItem, ResolveError> {
        let target = uri::dispatch(identifier, self.options.allow_search)?;
        self.resolver.resolve(target).await
    }

    /// Adaptateur de lecture pour un descripteur
    pub fn track(&self, descriptor: TrackDescriptor) -> SpotifyAudioTrack {
        SpotifyAudioTrack::new(
            descriptor,
            self.session().clone(),
            self.options.preferred_quality,
        )
    }

    /// Adaptateur de lecture depuis la forme encodée d'un descripteur
    pub fn decode_track(&self, encoded: &str) -> Result<SpotifyAudioTrack> {
        Ok(self.track(TrackDescriptor::decode(encoded)?))
    }

    /// Ferme la session
    pub async fn shutdown(&self) {
        info!("Shutting down Spotify source");
        self.session().close().await;
    }
}
