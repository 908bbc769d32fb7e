use super::Resolver;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, PlaylistResult};

impl Resolver {
    /// Un album : disques dans l'ordre, pistes dans l'ordre de chaque disque
    pub(crate) async fn album(&self, id: &SpotifyId) -> Result<PlaylistResult> {
        let album = match self.fetch(EntityType::Album, id).await? {
            EntityMetadata::Album(album) => album,
            other => return Err(SpotifyError::Malformed(format!("unexpected {}", other.kind()))),
        };

        let ids = album
            .disc
            .iter()
            .flat_map(|disc| disc.track.iter().map(|t| t.gid));
        let tracks = self.tracks(ids.collect::<Vec<_>>()).await?;

        Ok(PlaylistResult::new(album.name, tracks))
    }
}
