use super::Resolver;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, LoadedItem};
use crate::uri::parse_entity;
use tracing::debug;

impl Resolver {
    /// Radio générée à partir d'une piste, chargée comme une playlist
    pub(crate) async fn similar(&self, id: &SpotifyId) -> Result<LoadedItem> {
        let seed = self.session.radio_for_track(id).await?;
        if seed.total == 0 {
            debug!("No radio for track {}", id);
            return Ok(LoadedItem::NoTrack);
        }

        let Some(first) = seed.media_items.first() else {
            return Ok(LoadedItem::NoTrack);
        };
        let playlist_id = match parse_entity(&first.uri) {
            Some((EntityType::Playlist, raw)) => SpotifyId::from_base62(raw)?,
            _ => {
                debug!("Radio item '{}' is not a playlist", first.uri);
                return Ok(LoadedItem::NoTrack);
            }
        };

        let playlist = match self.fetch(EntityType::Playlist, &playlist_id).await? {
            EntityMetadata::Playlist(playlist) => playlist,
            other => return Err(SpotifyError::Malformed(format!("unexpected {}", other.kind()))),
        };
        Ok(LoadedItem::Playlist(self.expand_playlist(playlist).await?))
    }
}

#[cfg(test)]
mod tests {
    use crate::id::EntityType;
    use crate::models::{
        DEFAULT_IMAGE_CDN, EntityMetadata, LoadedItem, MediaItem, PlaylistItem, PlaylistMetadata,
        PlaylistPage, PlaylistTrackRef, RadioSeed,
    };
    use crate::resolver::Resolver;
    use crate::test_support::{FakeCatalog, fake_session, track_id, track_meta};
    use crate::uri::ResolveTarget;
    use std::sync::Arc;

    fn item(n: u128) -> PlaylistItem {
        PlaylistItem {
            track: Some(PlaylistTrackRef {
                id: Some(track_id(n).to_base62()),
            }),
        }
    }

    #[tokio::test]
    async fn test_radio_follows_two_pages_with_limit_one() {
        let catalog = FakeCatalog::default();
        for n in 1..=3 {
            catalog.add(EntityMetadata::Track(track_meta(n, &format!("R{}", n), Some("A"), vec![])));
        }
        catalog.add_radio(
            track_id(1),
            RadioSeed {
                total: 1,
                media_items: vec![MediaItem {
                    uri: track_id(900).to_uri(EntityType::Playlist),
                }],
            },
        );
        catalog.add_playlist(
            track_id(900),
            PlaylistMetadata {
                name: "Radio".into(),
                tracks: PlaylistPage {
                    items: vec![item(1), PlaylistItem { track: None }],
                    next: Some("next-2".into()),
                },
            },
        );
        catalog.add_page(
            "next-2",
            PlaylistPage {
                items: vec![item(2)],
                next: Some("next-3".into()),
            },
        );
        catalog.add_page(
            "next-3",
            PlaylistPage {
                items: vec![item(3)],
                next: None,
            },
        );
        let catalog = Arc::new(catalog);
        let resolver = Resolver::new(fake_session(catalog.clone()).await, DEFAULT_IMAGE_CDN, 1);

        let LoadedItem::Playlist(radio) =
            resolver.resolve(ResolveTarget::Similar(track_id(1))).await.unwrap()
        else {
            panic!("expected a playlist");
        };
        assert_eq!(radio.name, "Radio");
        let titles: Vec<_> = radio.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["R1", "R2"]);
        assert!(!catalog.requests().contains(&"page next-3".to_string()));
    }

    #[tokio::test]
    async fn test_empty_radio_is_no_track() {
        let catalog = FakeCatalog::default();
        catalog.add_radio(
            track_id(2),
            RadioSeed {
                total: 1,
                media_items: vec![MediaItem {
                    uri: track_id(3).to_uri(EntityType::Album),
                }],
            },
        );
        let resolver = Resolver::new(fake_session(Arc::new(catalog)).await, DEFAULT_IMAGE_CDN, 0);

        // total == 0 (radio absente du catalogue)
        assert_eq!(
            resolver.resolve(ResolveTarget::Similar(track_id(1))).await.unwrap(),
            LoadedItem::NoTrack
        );
        // premier élément qui n'est pas une playlist
        assert_eq!(
            resolver.resolve(ResolveTarget::Similar(track_id(2))).await.unwrap(),
            LoadedItem::NoTrack
        );
    }
}
