use super::Resolver;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, PlaylistItem, PlaylistMetadata, PlaylistResult};
use tracing::{debug, warn};

impl Resolver {
    /// Une playlist : première page puis pages de continuation
    pub(crate) async fn playlist(&self, id: &SpotifyId) -> Result<PlaylistResult> {
        let playlist = match self.fetch(EntityType::Playlist, id).await? {
            EntityMetadata::Playlist(playlist) => playlist,
            other => return Err(SpotifyError::Malformed(format!("unexpected {}", other.kind()))),
        };
        self.expand_playlist(playlist).await
    }

    /// Suit le curseur `next` tant qu'il existe et que la limite de pages
    /// de continuation n'est pas atteinte
    pub(crate) async fn expand_playlist(&self, playlist: PlaylistMetadata) -> Result<PlaylistResult> {
        let PlaylistMetadata { name, tracks: first } = playlist;
        let mut items: Vec<PlaylistItem> = first.items;
        let mut next = first.next;
        let mut continuation_pages = 0usize;

        while let Some(cursor) = next {
            if self.playlist_load_limit != 0 && continuation_pages >= self.playlist_load_limit {
                debug!(
                    "Playlist '{}' truncated after {} continuation pages",
                    name, continuation_pages
                );
                break;
            }
            let page = self.session.playlist_page(&cursor).await?;
            items.extend(page.items);
            next = page.next;
            continuation_pages += 1;
        }

        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let Some(track_ref) = item.track else {
                continue;
            };
            let Some(raw) = track_ref.id else {
                continue;
            };
            match SpotifyId::from_base62(&raw) {
                Ok(id) => ids.push(id),
                Err(e) => warn!("Skipping playlist item: {}", e),
            }
        }

        let tracks = self.tracks(ids).await?;
        Ok(PlaylistResult::new(name, tracks))
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{
        DEFAULT_IMAGE_CDN, EntityMetadata, LoadedItem, PlaylistItem, PlaylistMetadata,
        PlaylistPage, PlaylistTrackRef,
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

    fn page(items: Vec<PlaylistItem>, next: Option<&str>) -> PlaylistPage {
        PlaylistPage {
            items,
            next: next.map(str::to_string),
        }
    }

    /// Playlist de 4 pages chaînées, une piste par page
    fn chained_catalog() -> FakeCatalog {
        let catalog = FakeCatalog::default();
        for n in 1..=4 {
            catalog.add(EntityMetadata::Track(track_meta(n, &format!("T{}", n), Some("A"), vec![])));
        }
        catalog.add_playlist(
            track_id(77),
            PlaylistMetadata {
                name: "Mix".into(),
                tracks: page(vec![item(1), PlaylistItem { track: None }], Some("p2")),
            },
        );
        catalog.add_page("p2", page(vec![item(2)], Some("p3")));
        catalog.add_page("p3", page(vec![item(3)], Some("p4")));
        catalog.add_page("p4", page(vec![item(4)], None));
        catalog
    }

    #[tokio::test]
    async fn test_page_limit_counts_continuations() {
        let catalog = Arc::new(chained_catalog());
        let resolver = Resolver::new(fake_session(catalog.clone()).await, DEFAULT_IMAGE_CDN, 1);

        let LoadedItem::Playlist(mix) =
            resolver.resolve(ResolveTarget::Playlist(track_id(77))).await.unwrap()
        else {
            panic!("expected a playlist");
        };
        let titles: Vec<_> = mix.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["T1", "T2"]);

        let pages: Vec<_> = catalog
            .requests()
            .into_iter()
            .filter(|r| r.starts_with("page "))
            .collect();
        assert_eq!(pages, vec!["page p2"]);
    }

    #[tokio::test]
    async fn test_unlimited_pages() {
        let resolver = Resolver::new(
            fake_session(Arc::new(chained_catalog())).await,
            DEFAULT_IMAGE_CDN,
            0,
        );

        let LoadedItem::Playlist(mix) =
            resolver.resolve(ResolveTarget::Playlist(track_id(77))).await.unwrap()
        else {
            panic!("expected a playlist");
        };
        assert_eq!(mix.name, "Mix");
        let titles: Vec<_> = mix.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["T1", "T2", "T3", "T4"]);
    }

    #[tokio::test]
    async fn test_local_files_are_skipped() {
        let catalog = FakeCatalog::default();
        catalog.add(EntityMetadata::Track(track_meta(1, "T1", Some("A"), vec![])));
        catalog.add_playlist(
            track_id(5),
            PlaylistMetadata {
                name: "Local".into(),
                tracks: page(
                    vec![
                        PlaylistItem {
                            track: Some(PlaylistTrackRef { id: None }),
                        },
                        item(1),
                    ],
                    None,
                ),
            },
        );
        let resolver = Resolver::new(fake_session(Arc::new(catalog)).await, DEFAULT_IMAGE_CDN, 0);

        let LoadedItem::Playlist(list) =
            resolver.resolve(ResolveTarget::Playlist(track_id(5))).await.unwrap()
        else {
            panic!("expected a playlist");
        };
        assert_eq!(list.tracks.len(), 1);
    }
}
