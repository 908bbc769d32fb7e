//! Analyse des identifiants et aiguillage vers les résolveurs
//!
//! Formes acceptées :
//! - `spotify:{type}:{id}` et `https://open.spotify.com/[user/{u}/]{type}/{id}`
//! - `search:{texte libre}` si la recherche est autorisée
//! - `similar:{uri de piste}`

use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use regex::Regex;
use std::sync::LazyLock;

/// Préfixe de recherche libre
pub const SEARCH_PREFIX: &str = "search:";

/// Préfixe de radio à partir d'une piste
pub const SIMILAR_PREFIX: &str = "similar:";

static URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https://open\.spotify\.com/(user/[A-Za-z0-9]+/)?|spotify:)(album|playlist|track|artist|episode|show)[/:]([A-Za-z0-9]+).*$",
    )
    .expect("static regex is valid")
});

/// Cible d'un identifiant, un variant par résolveur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveTarget {
    Track(SpotifyId),
    Album(SpotifyId),
    Playlist(SpotifyId),
    Artist(SpotifyId),
    Episode(SpotifyId),
    Show(SpotifyId),
    Search(String),
    Similar(SpotifyId),
}

impl ResolveTarget {
    fn from_entity(kind: EntityType, id: SpotifyId) -> Self {
        match kind {
            EntityType::Track => ResolveTarget::Track(id),
            EntityType::Album => ResolveTarget::Album(id),
            EntityType::Playlist => ResolveTarget::Playlist(id),
            EntityType::Artist => ResolveTarget::Artist(id),
            EntityType::Episode => ResolveTarget::Episode(id),
            EntityType::Show => ResolveTarget::Show(id),
        }
    }
}

/// Extrait le type et l'identifiant d'une URI ou d'une URL du service
pub fn parse_entity(identifier: &str) -> Option<(EntityType, &str)> {
    let caps = URI_REGEX.captures(identifier)?;
    let kind = caps.get(3)?.as_str().parse().ok()?;
    Some((kind, caps.get(4)?.as_str()))
}

fn parse_entity_id(identifier: &str) -> Result<Option<(EntityType, SpotifyId)>> {
    match parse_entity(identifier) {
        Some((kind, raw)) => Ok(Some((kind, SpotifyId::from_base62(raw)?))),
        None => Ok(None),
    }
}

/// Détermine le résolveur à utiliser pour `identifier`
pub fn dispatch(identifier: &str, allow_search: bool) -> Result<ResolveTarget> {
    if let Some(query) = identifier.strip_prefix(SEARCH_PREFIX) {
        if !allow_search {
            return Err(SpotifyError::InvalidIdentifier(format!(
                "search is disabled: '{}'",
                identifier
            )));
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(SpotifyError::InvalidIdentifier("empty search query".into()));
        }
        return Ok(ResolveTarget::Search(query.to_string()));
    }

    if let Some(rest) = identifier.strip_prefix(SIMILAR_PREFIX) {
        return match parse_entity_id(rest)? {
            Some((EntityType::Track, id)) => Ok(ResolveTarget::Similar(id)),
            Some((kind, _)) => Err(SpotifyError::UnsupportedSimilarTarget(kind)),
            None => Err(SpotifyError::InvalidIdentifier(format!(
                "'{}' is not a track uri",
                rest
            ))),
        };
    }

    match parse_entity_id(identifier)? {
        Some((kind, id)) => Ok(ResolveTarget::from_entity(kind, id)),
        None => Err(SpotifyError::InvalidIdentifier(format!(
            "'{}' is not a spotify identifier",
            identifier
        ))),
    }
}

/// URL canonique d'une entité
pub fn canonical_uri(kind: EntityType, id: &SpotifyId) -> String {
    id.canonical_url(kind)
}
