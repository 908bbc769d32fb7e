//! Résolveurs par type d'entité
//!
//! Chaque résolveur transforme un identifiant analysé en un descripteur
//! ([`TrackDescriptor`]) ou en une liste ([`PlaylistResult`]). Les méthodes
//! sont réparties dans un fichier par type d'entité ; [`Resolver::resolve`]
//! est le seul point d'entrée public et convertit toute erreur en
//! [`ResolveError`].
//!
//! Les pistes d'une liste sont récupérées une à une, séquentiellement.

mod album;
mod artist;
mod episode;
mod playlist;
mod search;
mod show;
mod similar;
mod track;

use crate::error::{ResolveError, Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, LoadedItem, TrackDescriptor};
use crate::session::SpotifySession;
use crate::uri::ResolveTarget;
use tracing::{debug, warn};

/// Résolveur partagé, porte la session et les limites de chargement
#[derive(Clone)]
pub struct Resolver {
    session: SpotifySession,
    image_cdn: String,
    /// Nombre maximal de pages de continuation, 0 = illimité
    playlist_load_limit: usize,
}

impl Resolver {
    pub fn new(session: SpotifySession, image_cdn: impl Into<String>, playlist_load_limit: usize) -> Self {
        Self {
            session,
            image_cdn: image_cdn.into(),
            playlist_load_limit,
        }
    }

    pub fn session(&self) -> &SpotifySession {
        &self.session
    }

    /// Résout une cible
    pub async fn resolve(&self, target: ResolveTarget) -> std::result::Result<LoadedItem, ResolveError> {
        debug!("Resolving {:?}", target);
        let result = match target {
            ResolveTarget::Track(id) => self.track(&id).await.map(LoadedItem::Track),
            ResolveTarget::Episode(id) => self.episode(&id).await.map(LoadedItem::Track),
            ResolveTarget::Album(id) => self.album(&id).await.map(LoadedItem::Playlist),
            ResolveTarget::Artist(id) => self.artist(&id).await.map(LoadedItem::Playlist),
            ResolveTarget::Playlist(id) => self.playlist(&id).await.map(LoadedItem::Playlist),
            ResolveTarget::Show(id) => self.show(&id).await.map(LoadedItem::Playlist),
            ResolveTarget::Search(query) => self.search(&query).await,
            ResolveTarget::Similar(id) => self.similar(&id).await,
        };

        result.map_err(|e| {
            warn!("Spotify resolve failed: {}", e);
            ResolveError::from(e)
        })
    }

    /// Metadata attendue d'un type donné
    async fn fetch(&self, kind: EntityType, id: &SpotifyId) -> Result<EntityMetadata> {
        let meta = self.session.metadata(kind, id).await?;
        if meta.kind() != kind {
            return Err(SpotifyError::Malformed(format!(
                "expected {} metadata for {}, got {}",
                kind,
                id,
                meta.kind()
            )));
        }
        Ok(meta)
    }

    /// Descripteurs d'une suite de pistes, dans l'ordre donné
    async fn tracks(&self, ids: impl IntoIterator<Item = SpotifyId>) -> Result<Vec<TrackDescriptor>> {
        let mut tracks = Vec::new();
        for id in ids {
            tracks.push(self.track(&id).await?);
        }
        Ok(tracks)
    }
}
