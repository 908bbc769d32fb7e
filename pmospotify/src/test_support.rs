//! Connexion en mémoire pour les tests unitaires

use crate::api::content::ContentStream;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{
    AlbumMetadata, AlbumRef, ArtistMetadata, ArtistRef, Disc, EntityMetadata, EpisodeMetadata,
    GidRef, Image, ImageGroup, ImageSize, LyricsResponse, PlaylistMetadata, PlaylistPage,
    RadioSeed, SearchResults, ShowMetadata, TopTracks, TrackMetadata,
};
use crate::quality::RemoteFile;
use crate::session::{Connection, Connector};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn track_id(n: u128) -> SpotifyId {
    SpotifyId::from_raw(n)
}

fn cover(file_id: &str) -> ImageGroup {
    ImageGroup {
        image: vec![
            Image {
                file_id: format!("{}small", file_id),
                size: ImageSize::Small,
                width: Some(64),
                height: Some(64),
            },
            Image {
                file_id: file_id.to_string(),
                size: ImageSize::Large,
                width: Some(640),
                height: Some(640),
            },
        ],
    }
}

pub fn track_meta(n: u128, name: &str, artist: Option<&str>, file: Vec<RemoteFile>) -> TrackMetadata {
    TrackMetadata {
        gid: track_id(n),
        name: name.to_string(),
        artist: artist
            .map(|a| {
                vec![ArtistRef {
                    gid: None,
                    name: a.to_string(),
                }]
            })
            .unwrap_or_default(),
        album: Some(AlbumRef {
            gid: None,
            name: None,
            cover_group: Some(cover(&format!("cover{}", n))),
        }),
        duration: 1000 * n as u64,
        file,
    }
}

pub fn album_meta(n: u128, name: &str, discs: Vec<Vec<u128>>) -> AlbumMetadata {
    AlbumMetadata {
        gid: track_id(n),
        name: name.to_string(),
        disc: discs
            .into_iter()
            .enumerate()
            .map(|(i, tracks)| Disc {
                number: Some(i as u32 + 1),
                track: tracks.into_iter().map(|t| GidRef { gid: track_id(t) }).collect(),
            })
            .collect(),
        cover_group: Some(cover("album")),
    }
}

pub fn artist_meta(n: u128, name: &str, groups: Vec<Vec<u128>>) -> ArtistMetadata {
    ArtistMetadata {
        gid: track_id(n),
        name: name.to_string(),
        top_track: groups
            .into_iter()
            .map(|tracks| TopTracks {
                country: Some("FR".into()),
                track: tracks.into_iter().map(|t| GidRef { gid: track_id(t) }).collect(),
            })
            .collect(),
    }
}

pub fn episode_meta(n: u128, name: &str, audio: Vec<RemoteFile>) -> EpisodeMetadata {
    EpisodeMetadata {
        gid: track_id(n),
        name: name.to_string(),
        duration: 60_000,
        audio,
        cover_image: Some(cover(&format!("ep{}", n))),
    }
}

pub fn show_meta(n: u128, name: &str, episodes: Vec<u128>) -> ShowMetadata {
    ShowMetadata {
        gid: track_id(n),
        name: name.to_string(),
        episode: episodes.into_iter().map(|e| GidRef { gid: track_id(e) }).collect(),
        cover_image: None,
    }
}

/// Catalogue partagé entre les connexions successives d'un même connecteur
#[derive(Default)]
pub struct FakeCatalog {
    metadata: Mutex<HashMap<(EntityType, SpotifyId), EntityMetadata>>,
    pages: Mutex<HashMap<String, PlaylistPage>>,
    searches: Mutex<HashMap<String, SearchResults>>,
    radios: Mutex<HashMap<SpotifyId, RadioSeed>>,
    lyrics: Mutex<HashMap<SpotifyId, LyricsResponse>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<String>>,
    lost: AtomicBool,
}

impl FakeCatalog {
    pub fn add(&self, meta: EntityMetadata) {
        let id = match &meta {
            EntityMetadata::Track(m) => m.gid,
            EntityMetadata::Album(m) => m.gid,
            EntityMetadata::Artist(m) => m.gid,
            EntityMetadata::Episode(m) => m.gid,
            EntityMetadata::Show(m) => m.gid,
            EntityMetadata::Playlist(_) => panic!("use add_playlist"),
        };
        self.metadata.lock().unwrap().insert((meta.kind(), id), meta);
    }

    pub fn add_playlist(&self, id: SpotifyId, meta: PlaylistMetadata) {
        self.metadata
            .lock()
            .unwrap()
            .insert((EntityType::Playlist, id), EntityMetadata::Playlist(meta));
    }

    pub fn add_page(&self, url: &str, page: PlaylistPage) {
        self.pages.lock().unwrap().insert(url.to_string(), page);
    }

    pub fn add_search(&self, query: &str, results: SearchResults) {
        self.searches.lock().unwrap().insert(query.to_string(), results);
    }

    pub fn add_radio(&self, id: SpotifyId, seed: RadioSeed) {
        self.radios.lock().unwrap().insert(id, seed);
    }

    pub fn add_lyrics(&self, id: SpotifyId, lyrics: LyricsResponse) {
        self.lyrics.lock().unwrap().insert(id, lyrics);
    }

    pub fn add_file(&self, file_id: &str, data: &[u8]) {
        self.files.lock().unwrap().insert(file_id.to_string(), data.to_vec());
    }

    /// Simule un token révoqué : tous les appels répondent 401
    pub fn set_lost(&self, lost: bool) {
        self.lost.store(lost, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: String) -> Result<()> {
        self.requests.lock().unwrap().push(request);
        if self.lost.load(Ordering::SeqCst) {
            return Err(SpotifyError::from_status_code(401, "token revoked"));
        }
        Ok(())
    }
}

pub struct FakeConnection {
    catalog: Arc<FakeCatalog>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn metadata(&self, kind: EntityType, id: &SpotifyId) -> Result<EntityMetadata> {
        self.catalog.record(format!("metadata {} {}", kind, id.as_u128()))?;
        self.catalog
            .metadata
            .lock()
            .unwrap()
            .get(&(kind, *id))
            .cloned()
            .ok_or_else(|| SpotifyError::NotFound(id.to_uri(kind)))
    }

    async fn playlist_page(&self, next: &str) -> Result<PlaylistPage> {
        self.catalog.record(format!("page {}", next))?;
        self.catalog
            .pages
            .lock()
            .unwrap()
            .get(next)
            .cloned()
            .ok_or_else(|| SpotifyError::NotFound(next.to_string()))
    }

    async fn search(&self, query: &str) -> Result<SearchResults> {
        self.catalog.record(format!("search {}", query))?;
        Ok(self
            .catalog
            .searches
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn radio_for_track(&self, id: &SpotifyId) -> Result<RadioSeed> {
        self.catalog.record(format!("radio {}", id.as_u128()))?;
        Ok(self
            .catalog
            .radios
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn lyrics(&self, id: &SpotifyId) -> Result<Option<LyricsResponse>> {
        self.catalog.record(format!("lyrics {}", id.as_u128()))?;
        Ok(self.catalog.lyrics.lock().unwrap().get(id).cloned())
    }

    async fn open_file(&self, file: &RemoteFile) -> Result<ContentStream> {
        self.catalog.record(format!("file {}", file.file_id))?;
        let data = self
            .catalog
            .files
            .lock()
            .unwrap()
            .get(&file.file_id)
            .cloned()
            .ok_or_else(|| SpotifyError::NotFound(file.file_id.clone()))?;
        Ok(Box::pin(Cursor::new(data)))
    }

    async fn close(&self) {}
}

/// Issue scriptée d'une tentative de connexion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Ok,
    Transient,
    Auth,
    Config,
}

/// Connecteur scripté ; une fois le script épuisé, les connexions réussissent
pub struct FakeConnector {
    catalog: Arc<FakeCatalog>,
    script: Mutex<VecDeque<ConnectOutcome>>,
    attempts: AtomicUsize,
}

impl FakeConnector {
    pub fn new(catalog: Arc<FakeCatalog>, script: Vec<ConnectOutcome>) -> Self {
        Self {
            catalog,
            script: Mutex::new(script.into()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn catalog(&self) -> &FakeCatalog {
        &self.catalog
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Arc<dyn Connection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectOutcome::Ok);
        match outcome {
            ConnectOutcome::Ok => Ok(Arc::new(FakeConnection {
                catalog: self.catalog.clone(),
            })),
            ConnectOutcome::Transient => Err(SpotifyError::RemoteService {
                status: 503,
                message: "unavailable".into(),
            }),
            ConnectOutcome::Auth => Err(SpotifyError::Auth("bad credentials".into())),
            ConnectOutcome::Config => Err(SpotifyError::Config(anyhow::anyhow!(
                "unreadable credentials file"
            ))),
        }
    }
}

/// Session connectée sur un catalogue en mémoire
pub async fn fake_session(catalog: Arc<FakeCatalog>) -> crate::session::SpotifySession {
    let connector = Arc::new(FakeConnector::new(catalog, vec![]));
    crate::session::SpotifySession::connect(connector, std::time::Duration::from_secs(10))
        .await
        .unwrap()
}
