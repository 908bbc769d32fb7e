use super::Resolver;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, TrackDescriptor};

impl Resolver {
    /// Un épisode : auteur inconnu, pochette de l'épisode
    pub(crate) async fn episode(&self, id: &SpotifyId) -> Result<TrackDescriptor> {
        match self.fetch(EntityType::Episode, id).await? {
            EntityMetadata::Episode(episode) => Ok(episode.to_descriptor(&self.image_cdn)),
            other => Err(SpotifyError::Malformed(format!("unexpected {}", other.kind()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{DEFAULT_IMAGE_CDN, EntityMetadata, LoadedItem, UNKNOWN_ARTIST};
    use crate::resolver::Resolver;
    use crate::test_support::{FakeCatalog, episode_meta, fake_session, track_id};
    use crate::uri::ResolveTarget;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_episode_descriptor() {
        let catalog = FakeCatalog::default();
        catalog.add(EntityMetadata::Episode(episode_meta(3, "Pilot", vec![])));
        let resolver = Resolver::new(fake_session(Arc::new(catalog)).await, DEFAULT_IMAGE_CDN, 0);

        let LoadedItem::Track(episode) =
            resolver.resolve(ResolveTarget::Episode(track_id(3))).await.unwrap()
        else {
            panic!("expected a track");
        };
        assert_eq!(episode.author, UNKNOWN_ARTIST);
        assert!(episode.uri.starts_with("https://open.spotify.com/episode/"));
        assert_eq!(episode.artwork_url.as_deref(), Some("https://i.scdn.co/image/ep3"));
    }
}
