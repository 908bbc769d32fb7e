//! Identités du catalogue Spotify
//!
//! Un objet du catalogue est identifié par un entier de 128 bits. Il apparaît
//! sous deux formes :
//! - base62 sur 22 caractères dans les URI (`spotify:track:4uLU6hMCjMI75M1A2tKUQC`)
//! - hexadécimal sur 32 caractères (le "gid") dans les réponses de l'API metadata

use crate::error::{Result, SpotifyError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Longueur canonique d'un identifiant base62
pub const BASE62_LEN: usize = 22;

/// Préfixe des URL publiques du service
pub const OPEN_URL_PREFIX: &str = "https://open.spotify.com/";

/// Type d'entité du catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Album,
    Playlist,
    Track,
    Artist,
    Episode,
    Show,
}

impl EntityType {
    /// Nom utilisé dans les URI et les URL
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Album => "album",
            EntityType::Playlist => "playlist",
            EntityType::Track => "track",
            EntityType::Artist => "artist",
            EntityType::Episode => "episode",
            EntityType::Show => "show",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = SpotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "album" => Ok(EntityType::Album),
            "playlist" => Ok(EntityType::Playlist),
            "track" => Ok(EntityType::Track),
            "artist" => Ok(EntityType::Artist),
            "episode" => Ok(EntityType::Episode),
            "show" => Ok(EntityType::Show),
            other => Err(SpotifyError::InvalidIdentifier(format!(
                "unknown entity type '{}'",
                other
            ))),
        }
    }
}

/// Identité 128 bits d'un objet du catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpotifyId(u128);

impl SpotifyId {
    pub fn from_raw(id: u128) -> Self {
        Self(id)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// Décode un identifiant base62 (au plus 128 bits)
    pub fn from_base62(src: &str) -> Result<Self> {
        if src.is_empty() || src.len() > BASE62_LEN {
            return Err(SpotifyError::InvalidIdentifier(format!(
                "'{}' is not a base62 id",
                src
            )));
        }

        let mut id: u128 = 0;
        for c in src.bytes() {
            let digit = match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'z' => c - b'a' + 10,
                b'A'..=b'Z' => c - b'A' + 36,
                _ => {
                    return Err(SpotifyError::InvalidIdentifier(format!(
                        "invalid character '{}' in id '{}'",
                        c as char, src
                    )));
                }
            };
            id = id
                .checked_mul(62)
                .and_then(|v| v.checked_add(u128::from(digit)))
                .ok_or_else(|| {
                    SpotifyError::InvalidIdentifier(format!("id '{}' overflows 128 bits", src))
                })?;
        }

        Ok(Self(id))
    }

    /// Encode en base62 sur 22 caractères (zéros en tête conservés)
    pub fn to_base62(&self) -> String {
        let mut out = [b'0'; BASE62_LEN];
        let mut n = self.0;
        for slot in out.iter_mut().rev() {
            *slot = BASE62_ALPHABET[(n % 62) as usize];
            n /= 62;
        }
        // L'alphabet est ASCII
        out.iter().map(|&b| b as char).collect()
    }

    /// Décode un gid hexadécimal (16 octets)
    pub fn from_hex(src: &str) -> Result<Self> {
        let bytes = hex::decode(src)
            .map_err(|e| SpotifyError::Malformed(format!("invalid gid '{}': {}", src, e)))?;
        let raw: [u8; 16] = bytes
            .try_into()
            .map_err(|_| SpotifyError::Malformed(format!("gid '{}' is not 16 bytes", src)))?;
        Ok(Self(u128::from_be_bytes(raw)))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_be_bytes())
    }

    /// Décode une URI `spotify:{type}:{base62}`
    pub fn from_uri(uri: &str) -> Result<(EntityType, Self)> {
        let mut parts = uri.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("spotify"), Some(kind), Some(id)) => Ok((kind.parse()?, Self::from_base62(id)?)),
            _ => Err(SpotifyError::InvalidIdentifier(format!(
                "'{}' is not a spotify uri",
                uri
            ))),
        }
    }

    /// URI interne, `spotify:{type}:{base62}`
    pub fn to_uri(&self, kind: EntityType) -> String {
        format!("spotify:{}:{}", kind, self.to_base62())
    }

    /// URL publique canonique, `https://open.spotify.com/{type}/{base62}`
    pub fn canonical_url(&self, kind: EntityType) -> String {
        format!("{}{}/{}", OPEN_URL_PREFIX, kind, self.to_base62())
    }
}

impl fmt::Display for SpotifyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base62())
    }
}

/// Les gids circulent en hexadécimal dans les payloads JSON
impl Serialize for SpotifyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SpotifyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SpotifyId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Identité d'un élément lisible (piste ou épisode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayableId {
    Track(SpotifyId),
    Episode(SpotifyId),
}

impl PlayableId {
    pub fn id(&self) -> SpotifyId {
        match self {
            PlayableId::Track(id) | PlayableId::Episode(id) => *id,
        }
    }

    pub fn kind(&self) -> EntityType {
        match self {
            PlayableId::Track(_) => EntityType::Track,
            PlayableId::Episode(_) => EntityType::Episode,
        }
    }

    pub fn to_uri(&self) -> String {
        self.id().to_uri(self.kind())
    }

    /// Détermine piste ou épisode d'après la forme de l'URL canonique
    pub fn from_canonical_url(url: &str, identifier: &str) -> Result<Self> {
        let id = SpotifyId::from_base62(identifier)?;
        if url.starts_with(&format!("{}episode", OPEN_URL_PREFIX)) {
            Ok(PlayableId::Episode(id))
        } else {
            Ok(PlayableId::Track(id))
        }
    }
}

impl fmt::Display for PlayableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}
