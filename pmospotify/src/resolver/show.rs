use super::Resolver;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, PlaylistResult};

impl Resolver {
    /// Un show : épisodes du plus ancien au plus récent
    ///
    /// Le catalogue liste les épisodes du plus récent au plus ancien.
    pub(crate) async fn show(&self, id: &SpotifyId) -> Result<PlaylistResult> {
        let show = match self.fetch(EntityType::Show, id).await? {
            EntityMetadata::Show(show) => show,
            other => return Err(SpotifyError::Malformed(format!("unexpected {}", other.kind()))),
        };

        let mut episodes = Vec::with_capacity(show.episode.len());
        for episode in &show.episode {
            episodes.push(self.episode(&episode.gid).await?);
        }
        episodes.reverse();

        Ok(PlaylistResult::new(show.name, episodes))
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{DEFAULT_IMAGE_CDN, EntityMetadata, LoadedItem};
    use crate::resolver::Resolver;
    use crate::test_support::{FakeCatalog, episode_meta, fake_session, show_meta, track_id};
    use crate::uri::ResolveTarget;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_show_episodes_reversed() {
        let catalog = FakeCatalog::default();
        catalog.add(EntityMetadata::Show(show_meta(9, "Podcast", vec![3, 2, 1])));
        for n in 1..=3 {
            catalog.add(EntityMetadata::Episode(episode_meta(n, &format!("Ep{}", n), vec![])));
        }
        let resolver = Resolver::new(fake_session(Arc::new(catalog)).await, DEFAULT_IMAGE_CDN, 0);

        let LoadedItem::Playlist(show) =
            resolver.resolve(ResolveTarget::Show(track_id(9))).await.unwrap()
        else {
            panic!("expected a playlist");
        };
        let titles: Vec<_> = show.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Ep1", "Ep2", "Ep3"]);
    }
}
