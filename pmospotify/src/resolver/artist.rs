use super::Resolver;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, PlaylistResult};

impl Resolver {
    /// Top tracks d'un artiste, tous groupes confondus, sans dédoublonnage
    pub(crate) async fn artist(&self, id: &SpotifyId) -> Result<PlaylistResult> {
        let artist = match self.fetch(EntityType::Artist, id).await? {
            EntityMetadata::Artist(artist) => artist,
            other => return Err(SpotifyError::Malformed(format!("unexpected {}", other.kind()))),
        };

        let ids: Vec<SpotifyId> = artist
            .top_track
            .iter()
            .flat_map(|group| group.track.iter().map(|t| t.gid))
            .collect();
        let tracks = self.tracks(ids).await?;

        Ok(PlaylistResult::new(artist.name, tracks))
    }
}
