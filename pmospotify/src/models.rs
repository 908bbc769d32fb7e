//! Structures de données : descripteurs produits et payloads du service

use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::quality::RemoteFile;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Auteur affiché lorsque l'élément n'a pas d'artiste (épisodes)
pub const UNKNOWN_ARTIST: &str = "UNKNOWN ARTIST";

/// Base des URL d'images
pub const DEFAULT_IMAGE_CDN: &str = "https://i.scdn.co/image/";

// ============ Descripteurs produits ============

/// Représentation prête à jouer d'un élément résolu
///
/// Immuable une fois créé ; [`TrackDescriptor::shallow_clone`] en produit une
/// copie indépendante.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    pub title: String,
    pub author: String,
    /// Durée en millisecondes
    pub length_ms: u64,
    /// Identifiant base62
    pub identifier: String,
    /// URL canonique `https://open.spotify.com/{type}/{identifier}`
    pub uri: String,
    pub artwork_url: Option<String>,
}

impl TrackDescriptor {
    /// Construit le descripteur d'un élément du catalogue
    pub fn new(
        kind: EntityType,
        id: SpotifyId,
        title: impl Into<String>,
        author: impl Into<String>,
        length_ms: u64,
        artwork_url: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            length_ms,
            identifier: id.to_base62(),
            uri: id.canonical_url(kind),
            artwork_url,
        }
    }

    pub fn shallow_clone(&self) -> Self {
        self.clone()
    }

    /// Forme opaque transmissible aux clients
    pub fn encode(&self) -> Result<String> {
        Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?))
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| SpotifyError::InvalidIdentifier(format!("bad encoded track: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Liste ordonnée de descripteurs (album, show, recherche, playlist…)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResult {
    pub name: String,
    pub tracks: Vec<TrackDescriptor>,
    pub selected_track: Option<usize>,
    pub is_search_result: bool,
}

impl PlaylistResult {
    pub fn new(name: impl Into<String>, tracks: Vec<TrackDescriptor>) -> Self {
        Self {
            name: name.into(),
            tracks,
            selected_track: None,
            is_search_result: false,
        }
    }

    pub fn search_result(name: impl Into<String>, tracks: Vec<TrackDescriptor>) -> Self {
        Self {
            is_search_result: true,
            ..Self::new(name, tracks)
        }
    }
}

/// Résultat d'un chargement d'identifiant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedItem {
    Track(TrackDescriptor),
    Playlist(PlaylistResult),
    /// Rien ne correspond (recherche vide, radio vide)
    NoTrack,
}

// ============ Payloads metadata ============

/// Taille déclarée d'une variante d'image
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageSize {
    #[default]
    Default,
    Small,
    Large,
    Xlarge,
}

impl ImageSize {
    /// Rang utilisé pour choisir la plus grande variante
    fn rank(&self) -> u8 {
        match self {
            ImageSize::Small => 0,
            ImageSize::Default => 1,
            ImageSize::Large => 2,
            ImageSize::Xlarge => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub file_id: String,
    #[serde(default)]
    pub size: ImageSize,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGroup {
    #[serde(default)]
    pub image: Vec<Image>,
}

impl ImageGroup {
    /// Plus grande variante : rang de taille, puis surface en pixels
    pub fn biggest(&self) -> Option<&Image> {
        self.image.iter().max_by_key(|img| {
            let area = u64::from(img.width.unwrap_or(0)) * u64::from(img.height.unwrap_or(0));
            (img.size.rank(), area)
        })
    }

    /// URL de la plus grande variante
    pub fn biggest_url(&self, image_cdn: &str) -> Option<String> {
        self.biggest()
            .map(|img| format!("{}{}", image_cdn, img.file_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub gid: Option<SpotifyId>,
    pub name: String,
}

/// Référence vers une piste ou un épisode (seul le gid est renseigné)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GidRef {
    pub gid: SpotifyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub gid: Option<SpotifyId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cover_group: Option<ImageGroup>,
}

/// Réponse metadata d'une piste
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub gid: SpotifyId,
    pub name: String,
    #[serde(default)]
    pub artist: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    /// Durée en millisecondes
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub file: Vec<RemoteFile>,
}

impl TrackMetadata {
    pub fn primary_artist(&self) -> &str {
        self.artist
            .first()
            .map(|a| a.name.as_str())
            .unwrap_or(UNKNOWN_ARTIST)
    }

    pub fn cover_group(&self) -> Option<&ImageGroup> {
        self.album.as_ref().and_then(|a| a.cover_group.as_ref())
    }

    /// Descripteur avec la pochette fournie (celle de l'album par défaut)
    pub fn to_descriptor(&self, cover: Option<&ImageGroup>, image_cdn: &str) -> TrackDescriptor {
        TrackDescriptor::new(
            EntityType::Track,
            self.gid,
            &self.name,
            self.primary_artist(),
            self.duration,
            cover
                .or_else(|| self.cover_group())
                .and_then(|g| g.biggest_url(image_cdn)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disc {
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub track: Vec<GidRef>,
}

/// Réponse metadata d'un album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumMetadata {
    pub gid: SpotifyId,
    pub name: String,
    #[serde(default)]
    pub disc: Vec<Disc>,
    #[serde(default)]
    pub cover_group: Option<ImageGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopTracks {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub track: Vec<GidRef>,
}

/// Réponse metadata d'un artiste
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistMetadata {
    pub gid: SpotifyId,
    pub name: String,
    #[serde(default)]
    pub top_track: Vec<TopTracks>,
}

/// Réponse metadata d'un épisode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub gid: SpotifyId,
    pub name: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub audio: Vec<RemoteFile>,
    #[serde(default)]
    pub cover_image: Option<ImageGroup>,
}

impl EpisodeMetadata {
    pub fn to_descriptor(&self, image_cdn: &str) -> TrackDescriptor {
        TrackDescriptor::new(
            EntityType::Episode,
            self.gid,
            &self.name,
            UNKNOWN_ARTIST,
            self.duration,
            self.cover_image
                .as_ref()
                .and_then(|g| g.biggest_url(image_cdn)),
        )
    }
}

/// Réponse metadata d'un show (podcast)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowMetadata {
    pub gid: SpotifyId,
    pub name: String,
    #[serde(default)]
    pub episode: Vec<GidRef>,
    #[serde(default)]
    pub cover_image: Option<ImageGroup>,
}

// ============ Playlists (Web API) ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTrackRef {
    /// Identifiant base62, absent pour les fichiers locaux
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<PlaylistTrackRef>,
}

/// Page de pistes d'une playlist, `next` est le curseur de continuation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Réponse `GET /playlists/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tracks: PlaylistPage,
}

/// Metadata d'une entité, selon son type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityMetadata {
    Track(TrackMetadata),
    Album(AlbumMetadata),
    Artist(ArtistMetadata),
    Episode(EpisodeMetadata),
    Show(ShowMetadata),
    Playlist(PlaylistMetadata),
}

impl EntityMetadata {
    pub fn kind(&self) -> EntityType {
        match self {
            EntityMetadata::Track(_) => EntityType::Track,
            EntityMetadata::Album(_) => EntityType::Album,
            EntityMetadata::Artist(_) => EntityType::Artist,
            EntityMetadata::Episode(_) => EntityType::Episode,
            EntityMetadata::Show(_) => EntityType::Show,
            EntityMetadata::Playlist(_) => EntityType::Playlist,
        }
    }

    /// Fichiers audio de l'entité (pistes et épisodes uniquement)
    pub fn audio_files(&self) -> &[RemoteFile] {
        match self {
            EntityMetadata::Track(t) => &t.file,
            EntityMetadata::Episode(e) => &e.audio,
            _ => &[],
        }
    }
}

// ============ Recherche, radio, lyrics ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchArtist {
    pub name: String,
}

/// Un résultat "tracks" de la recherche
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    /// `spotify:track:{base62}`
    pub uri: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub artists: Vec<SearchArtist>,
}

impl SearchHit {
    pub fn to_descriptor(&self) -> Result<TrackDescriptor> {
        let (_, id) = SpotifyId::from_uri(&self.uri)?;
        let author = self
            .artists
            .first()
            .map(|a| a.name.as_str())
            .unwrap_or(UNKNOWN_ARTIST);
        Ok(TrackDescriptor::new(
            EntityType::Track,
            id,
            &self.name,
            author,
            self.duration,
            self.image.clone(),
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBucket {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBuckets {
    #[serde(default)]
    pub tracks: Option<SearchBucket>,
}

/// Réponse de la recherche
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: SearchBuckets,
}

impl SearchResults {
    /// Hits du premier bucket "tracks" (vide si absent)
    pub fn track_hits(&self) -> &[SearchHit] {
        self.results
            .tracks
            .as_ref()
            .map(|b| b.hits.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub uri: String,
}

/// Réponse du générateur de radio (seed → playlist)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioSeed {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsWord {
    #[serde(default)]
    pub string: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsLine {
    #[serde(default)]
    pub words: Vec<LyricsWord>,
}

/// Réponse brute du service de paroles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsResponse {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub lines: Vec<LyricsLine>,
}
