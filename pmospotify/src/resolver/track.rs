use super::Resolver;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, TrackDescriptor};

impl Resolver {
    /// Une piste : un seul appel metadata, pochette de l'album
    pub(crate) async fn track(&self, id: &SpotifyId) -> Result<TrackDescriptor> {
        match self.fetch(EntityType::Track, id).await? {
            EntityMetadata::Track(track) => Ok(track.to_descriptor(None, &self.image_cdn)),
            other => Err(SpotifyError::Malformed(format!("unexpected {}", other.kind()))),
        }
    }
}
