//! # pmospotify - Source Spotify pour PMOMusic
//!
//! Cette crate relie le catalogue Spotify au pipeline de lecture PMOMusic :
//! à partir d'un identifiant opaque (URI, URL, recherche, radio), elle
//! s'authentifie, résout l'identifiant en pistes décrites par leurs
//! métadonnées, puis, au moment de la lecture, négocie un fichier audio et
//! fournit un flux d'octets étiqueté avec son conteneur.
//!
//! ## Vue d'ensemble
//!
//! - Session authentifiée avec reconnexion automatique ([`SpotifySession`])
//! - Analyse des identifiants `spotify:…`, `https://open.spotify.com/…`,
//!   `search:…` et `similar:…` ([`uri`])
//! - Résolveurs : piste, épisode, album, artiste, playlist, show, recherche,
//!   radio ([`resolver`])
//! - Négociation codec/qualité : Vorbis, puis AAC, puis MP3 ([`quality`])
//! - Paroles et recommandations ([`lookup`], et [`api_rest`] avec la feature
//!   `server`)
//!
//! Le décodage audio, la lecture et le seek ne font pas partie de la crate.
//!
//! ## Structure des modules
//!
//! ```text
//! pmospotify/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── id.rs               # Identités 128 bits (base62 / gid)
//! │   ├── uri.rs              # Grammaire des identifiants
//! │   ├── models.rs           # Descripteurs et payloads
//! │   ├── quality.rs          # Négociation du fichier audio
//! │   ├── session/            # Session, reconnexion, connecteur HTTP
//! │   ├── api/                # Client HTTP bas-niveau
//! │   ├── resolver/           # Un résolveur par type d'entité
//! │   ├── track.rs            # Adaptateur de lecture
//! │   ├── source.rs           # Point d'entrée
//! │   ├── lookup.rs           # Paroles / recommandations
//! │   ├── config_ext.rs       # Extension pmoconfig
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmoconfig::Config;
//! use pmospotify::{LoadedItem, SessionSettings, SourceOptions, SpotifySession, SpotifySource};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_config("")?;
//!     let session = SpotifySession::connect_with_settings(SessionSettings::from_config(&config)?).await?;
//!     let source = SpotifySource::new(session, SourceOptions::from_config(&config)?);
//!
//!     if let LoadedItem::Track(track) = source.load_item("spotify:track:4uLU6hMCjMI75M1A2tKUQC").await? {
//!         let stream = source.track(track).open().await?;
//!         println!("container: {:?}", stream.container());
//!     }
//!
//!     source.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config_ext;
pub mod error;
pub mod id;
pub mod lookup;
pub mod models;
pub mod quality;
pub mod resolver;
pub mod session;
pub mod source;
pub mod track;
pub mod uri;

// Extension serveur (feature-gated)
#[cfg(feature = "server")]
pub mod api_rest;

#[cfg(test)]
mod test_support;

pub use config_ext::SpotifyConfigExt;
pub use error::{ResolveError, Result, Severity, SpotifyError};
pub use id::{EntityType, PlayableId, SpotifyId};
pub use models::{LoadedItem, PlaylistResult, TrackDescriptor};
pub use quality::{AudioFormat, AudioQuality, AudioQualityPicker, ContainerFormat, RemoteFile};
pub use session::{SessionSettings, SessionState, SpotifySession};
pub use source::{SourceOptions, SpotifySource};
pub use track::{SpotifyAudioTrack, TaggedStream};
pub use uri::{ResolveTarget, dispatch};
