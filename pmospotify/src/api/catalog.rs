//! Endpoints du catalogue : metadata, recherche, radio, playlists, paroles

use super::SpotifyApi;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{
    AlbumMetadata, ArtistMetadata, EntityMetadata, EpisodeMetadata, LyricsResponse,
    PlaylistMetadata, PlaylistPage, RadioSeed, SearchResults, ShowMetadata, TrackMetadata,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Portée du token nécessaire à la lecture des playlists
pub const PLAYLIST_READ_SCOPE: &str = "playlist-read";

impl SpotifyApi {
    async fn metadata_of<T: DeserializeOwned>(&self, kind: EntityType, id: &SpotifyId) -> Result<T> {
        let url = self.url(
            &self.endpoints().spclient,
            &["metadata", "4", kind.as_str(), &id.to_hex()],
        )?;
        self.get(url).await
    }

    /// Metadata d'une entité hors playlist
    ///
    /// Les playlists passent par la Web API et un token à portée, voir
    /// [`SpotifyApi::get_playlist`].
    pub async fn get_metadata(&self, kind: EntityType, id: &SpotifyId) -> Result<EntityMetadata> {
        debug!("Fetching {} metadata for {}", kind, id);
        Ok(match kind {
            EntityType::Track => EntityMetadata::Track(self.metadata_of::<TrackMetadata>(kind, id).await?),
            EntityType::Album => EntityMetadata::Album(self.metadata_of::<AlbumMetadata>(kind, id).await?),
            EntityType::Artist => {
                EntityMetadata::Artist(self.metadata_of::<ArtistMetadata>(kind, id).await?)
            }
            EntityType::Episode => {
                EntityMetadata::Episode(self.metadata_of::<EpisodeMetadata>(kind, id).await?)
            }
            EntityType::Show => EntityMetadata::Show(self.metadata_of::<ShowMetadata>(kind, id).await?),
            EntityType::Playlist => {
                return Err(SpotifyError::Other(
                    "playlist metadata requires a scoped token".into(),
                ));
            }
        })
    }

    /// Première page d'une playlist (Web API)
    pub async fn get_playlist(&self, id: &SpotifyId, token: &str) -> Result<PlaylistMetadata> {
        let url = self.url(&self.endpoints().web_api, &["playlists", &id.to_base62()])?;
        self.get_with_token(url, token).await
    }

    /// Page suivante, `next` est l'URL absolue fournie par la page précédente
    pub async fn get_playlist_page(&self, next: &str, token: &str) -> Result<PlaylistPage> {
        let url = Url::parse(next)
            .map_err(|e| SpotifyError::Malformed(format!("invalid next cursor '{}': {}", next, e)))?;
        self.get_with_token(url, token).await
    }

    /// Recherche libre
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let url = self.url(
            &self.endpoints().spclient,
            &["searchview", "km", "v4", "search", query],
        )?;
        self.get(url).await
    }

    /// Playlist radio générée à partir d'une piste
    pub async fn radio_for_track(&self, id: &SpotifyId) -> Result<RadioSeed> {
        let mut url = self.url(
            &self.endpoints().spclient,
            &[
                "inspiredby-mix",
                "v2",
                "seed_to_playlist",
                &id.to_uri(EntityType::Track),
            ],
        )?;
        url.query_pairs_mut().append_pair("response-format", "json");
        self.get(url).await
    }

    /// Paroles d'une piste, `None` si le service n'en a pas
    pub async fn lyrics(&self, id: &SpotifyId) -> Result<Option<LyricsResponse>> {
        let url = self.url(
            &self.endpoints().spclient,
            &["lyrics", "v1", "track", &id.to_base62()],
        )?;
        match self.get(url).await {
            Ok(lyrics) => Ok(Some(lyrics)),
            Err(SpotifyError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
