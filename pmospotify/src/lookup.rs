//! Requêtes annexes exposées au front-end : paroles et recommandations
//!
//! Ces fonctions ne renvoient jamais d'erreur : tout échec est converti en un
//! payload de forme fixe (vide pour les paroles, `LOAD_FAILED` pour les
//! recommandations).

use crate::error::{Result, Severity, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{LoadedItem, LyricsResponse, PlaylistResult, TrackDescriptor};
use crate::source::SpotifySource;
use crate::uri::{SIMILAR_PREFIX, parse_entity};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Message par défaut d'un échec de recommandations
pub const DEFAULT_FAILURE_MESSAGE: &str = "Spotify Rest got an exception";

const LYRICS_PLACEHOLDER: &str = "♪";

/// Paroles d'une piste ; tout à `null` et `lyrics` vide en cas d'échec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsPayload {
    pub track_id: Option<String>,
    pub track_name: Option<String>,
    pub track_artist: Option<String>,
    pub track_url: Option<String>,
    pub image_url: Option<String>,
    pub language: Option<String>,
    pub lyrics: Vec<String>,
}

/// Lignes affichables : lignes sans premier mot retirées, `♪` vidé
fn lyrics_lines(response: &LyricsResponse) -> Vec<String> {
    response
        .lines
        .iter()
        .filter_map(|line| {
            let first = line.words.first().map(|w| w.string.as_str()).unwrap_or("");
            match first {
                "" => None,
                LYRICS_PLACEHOLDER => Some(String::new()),
                text => Some(text.to_string()),
            }
        })
        .collect()
}

async fn try_lyrics(source: &SpotifySource, title: &str) -> Result<Option<LyricsPayload>> {
    let session = source.session();
    let results = session.search(title).await?;
    let Some(hit) = results.track_hits().first() else {
        return Ok(None);
    };

    let (_, id) = SpotifyId::from_uri(&hit.uri)?;
    let artist = hit
        .artists
        .first()
        .map(|a| a.name.clone())
        .ok_or_else(|| SpotifyError::Malformed(format!("search hit {} has no artist", hit.uri)))?;

    let Some(response) = session.lyrics(&id).await? else {
        return Ok(None);
    };
    if response.lines.is_empty() {
        return Ok(None);
    }

    Ok(Some(LyricsPayload {
        track_id: Some(id.to_base62()),
        track_name: Some(hit.name.clone()),
        track_artist: Some(artist),
        track_url: Some(id.canonical_url(EntityType::Track)),
        image_url: hit.image.clone(),
        language: response.language.clone(),
        lyrics: lyrics_lines(&response),
    }))
}

/// Paroles du premier résultat de recherche pour `title`
pub async fn lyrics(source: &SpotifySource, title: &str) -> LyricsPayload {
    info!("Got request to load lyrics for title: {}", title);
    let payload = match try_lyrics(source, title).await {
        Ok(Some(payload)) => payload,
        Ok(None) => LyricsPayload::default(),
        Err(e) => {
            debug!("Lyrics lookup for '{}' failed: {}", title, e);
            LyricsPayload::default()
        }
    };
    info!("Loaded lyrics for title: {}", title);
    payload
}

/// Informations affichables d'une piste recommandée
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    pub thumbnail: Option<String>,
    pub is_seekable: bool,
    pub author: String,
    pub length: u64,
    pub is_stream: bool,
    pub source_name: String,
    pub position: u64,
    pub title: String,
    pub uri: String,
}

impl TrackInfo {
    fn from_descriptor(track: &TrackDescriptor, source_name: &str) -> Self {
        Self {
            identifier: track.identifier.clone(),
            thumbnail: track.artwork_url.clone(),
            is_seekable: false,
            author: track.author.clone(),
            length: track.length_ms,
            is_stream: false,
            source_name: source_name.to_string(),
            position: 0,
            title: track.title.clone(),
            uri: track.uri.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedTrack {
    /// Forme encodée du descripteur, voir [`TrackDescriptor::encode`]
    pub track: String,
    pub info: TrackInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_track: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    PlaylistLoaded,
    LoadFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupException {
    pub message: String,
    pub severity: Severity,
}

/// Réponse de recommandations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsPayload {
    pub playlist_info: PlaylistInfo,
    pub load_type: LoadType,
    pub tracks: Vec<EncodedTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<LookupException>,
}

impl RecommendationsPayload {
    pub fn failed(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            playlist_info: PlaylistInfo::default(),
            load_type: LoadType::LoadFailed,
            tracks: Vec::new(),
            exception: Some(LookupException {
                message: message.into(),
                severity,
            }),
        }
    }

    fn loaded(playlist: &PlaylistResult, source_name: &str) -> Result<Self> {
        let tracks = playlist
            .tracks
            .iter()
            .map(|t| {
                Ok(EncodedTrack {
                    track: t.encode()?,
                    info: TrackInfo::from_descriptor(t, source_name),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            playlist_info: PlaylistInfo {
                name: Some(playlist.name.clone()),
                selected_track: playlist.selected_track,
            },
            load_type: LoadType::PlaylistLoaded,
            tracks,
            exception: None,
        })
    }
}

impl Default for RecommendationsPayload {
    fn default() -> Self {
        Self::failed(DEFAULT_FAILURE_MESSAGE, Severity::Common)
    }
}

/// Radio à partir de l'URL d'une piste
pub async fn recommendations(source: &SpotifySource, url: &str) -> RecommendationsPayload {
    info!("Got request to load spotify recommendations for identifier: {}", url);

    let payload = match parse_entity(url) {
        None => RecommendationsPayload::failed("Invalid Spotify URL.", Severity::Common),
        Some((kind, _)) if kind != EntityType::Track => {
            RecommendationsPayload::failed("Only accept spotify track uri", Severity::Common)
        }
        Some(_) => match source.load_item(&format!("{}{}", SIMILAR_PREFIX, url)).await {
            Ok(LoadedItem::Playlist(playlist)) => {
                RecommendationsPayload::loaded(&playlist, source.source_name())
                    .unwrap_or_else(|e| RecommendationsPayload::failed(e.to_string(), e.severity()))
            }
            Ok(_) => RecommendationsPayload::default(),
            Err(e) => RecommendationsPayload::failed(e.message, e.severity),
        },
    };

    info!("Loaded spotify recommendations for identifier: {}", url);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EntityMetadata, LyricsLine, LyricsWord, MediaItem, PlaylistItem, PlaylistMetadata,
        PlaylistPage, PlaylistTrackRef, RadioSeed, SearchArtist, SearchBucket, SearchBuckets,
        SearchHit, SearchResults,
    };
    use crate::source::SourceOptions;
    use crate::test_support::{FakeCatalog, fake_session, track_id, track_meta};
    use std::sync::Arc;

    fn line(words: &[&str]) -> LyricsLine {
        LyricsLine {
            words: words
                .iter()
                .map(|w| LyricsWord { string: w.to_string() })
                .collect(),
        }
    }

    fn catalog_with_song() -> FakeCatalog {
        let catalog = FakeCatalog::default();
        catalog.add_search(
            "song",
            SearchResults {
                results: SearchBuckets {
                    tracks: Some(SearchBucket {
                        hits: vec![SearchHit {
                            name: "Song".into(),
                            uri: track_id(1).to_uri(EntityType::Track),
                            image: Some("https://i.scdn.co/image/ab".into()),
                            duration: 1,
                            artists: vec![SearchArtist { name: "Singer".into() }],
                        }],
                    }),
                },
            },
        );
        catalog
    }

    async fn source(catalog: FakeCatalog) -> SpotifySource {
        SpotifySource::new(fake_session(Arc::new(catalog)).await, SourceOptions::default())
    }

    #[tokio::test]
    async fn test_lyrics_lines_are_cleaned() {
        let catalog = catalog_with_song();
        catalog.add_lyrics(
            track_id(1),
            LyricsResponse {
                language: Some("en".into()),
                lines: vec![line(&["Hello"]), line(&[""]), line(&["♪"]), line(&[]), line(&["World"])],
            },
        );

        let payload = lyrics(&source(catalog).await, "song").await;
        assert_eq!(payload.lyrics, vec!["Hello", "", "World"]);
        assert_eq!(payload.track_artist.as_deref(), Some("Singer"));
        assert_eq!(payload.language.as_deref(), Some("en"));
        assert_eq!(
            payload.track_url,
            Some(format!("https://open.spotify.com/track/{}", track_id(1).to_base62()))
        );
    }

    #[tokio::test]
    async fn test_lyrics_failures_are_empty() {
        // pas de paroles pour la piste
        let payload = lyrics(&source(catalog_with_song()).await, "song").await;
        assert_eq!(payload, LyricsPayload::default());

        // pas de résultat de recherche
        let payload = lyrics(&source(FakeCatalog::default()).await, "nothing").await;
        assert_eq!(payload, LyricsPayload::default());

        let json = serde_json::to_value(LyricsPayload::default()).unwrap();
        assert!(json["trackId"].is_null());
        assert_eq!(json["lyrics"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_recommendations_failures() {
        let source = source(FakeCatalog::default()).await;

        let payload = recommendations(&source, "https://example.com/track/abc").await;
        assert_eq!(payload.load_type, LoadType::LoadFailed);
        assert_eq!(payload.exception.unwrap().message, "Invalid Spotify URL.");

        let album = format!("https://open.spotify.com/album/{}", track_id(1).to_base62());
        let payload = recommendations(&source, &album).await;
        assert_eq!(payload.exception.unwrap().message, "Only accept spotify track uri");

        // radio vide
        let track = format!("https://open.spotify.com/track/{}", track_id(1).to_base62());
        let payload = recommendations(&source, &track).await;
        assert_eq!(payload, RecommendationsPayload::default());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["loadType"], "LOAD_FAILED");
        assert_eq!(json["playlistInfo"], serde_json::json!({}));
        assert_eq!(json["exception"]["severity"], "COMMON");
        assert_eq!(json["exception"]["message"], DEFAULT_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_recommendations_loaded() {
        let catalog = FakeCatalog::default();
        catalog.add(EntityMetadata::Track(track_meta(2, "Next", Some("B"), vec![])));
        catalog.add_radio(
            track_id(1),
            RadioSeed {
                total: 1,
                media_items: vec![MediaItem {
                    uri: track_id(10).to_uri(EntityType::Playlist),
                }],
            },
        );
        catalog.add_playlist(
            track_id(10),
            PlaylistMetadata {
                name: "Radio".into(),
                tracks: PlaylistPage {
                    items: vec![PlaylistItem {
                        track: Some(PlaylistTrackRef {
                            id: Some(track_id(2).to_base62()),
                        }),
                    }],
                    next: None,
                },
            },
        );
        let source = source(catalog).await;

        let url = format!("https://open.spotify.com/track/{}", track_id(1).to_base62());
        let payload = recommendations(&source, &url).await;
        assert_eq!(payload.load_type, LoadType::PlaylistLoaded);
        assert_eq!(payload.playlist_info.name.as_deref(), Some("Radio"));
        assert_eq!(payload.tracks.len(), 1);

        let track = &payload.tracks[0];
        assert_eq!(track.info.source_name, "spotify");
        assert!(!track.info.is_seekable);
        let decoded = TrackDescriptor::decode(&track.track).unwrap();
        assert_eq!(decoded.title, "Next");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["loadType"], "PLAYLIST_LOADED");
        assert!(json.get("exception").is_none());
        assert_eq!(json["tracks"][0]["info"]["isStream"], false);
    }
}
