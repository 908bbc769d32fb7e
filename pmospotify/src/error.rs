//! Gestion des erreurs pour la source Spotify

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::id::EntityType;

/// Type Result personnalisé pour pmospotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Erreurs possibles lors de l'utilisation de la session ou des résolveurs
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Identifiant mal formé ou non supporté
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// `similar:` appliqué à autre chose qu'une piste
    #[error("Only track URIs are accepted for similar lookups, got {0}")]
    UnsupportedSimilarTarget(EntityType),

    /// Authentification refusée (credentials invalides), fatale
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Session déconnectée ou en cours de reconnexion
    #[error("Spotify session is not available")]
    SessionUnavailable,

    /// Réponse inattendue du service distant
    #[error("Spotify API returned {status}: {message}")]
    RemoteService { status: u16, message: String },

    /// Réponse syntaxiquement valide mais incomplète
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Ressource introuvable
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Aucun fichier audio exploitable pour l'élément
    #[error("No suitable audio file for {0}")]
    NoAudioFile(String),

    /// Conteneur audio non pris en charge en aval
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Erreur d'entrée/sortie
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Erreur générique
    #[error("Spotify error: {0}")]
    Other(String),
}

impl SpotifyError {
    /// Crée une erreur depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            404 => Self::NotFound(message.into()),
            _ => Self::RemoteService {
                status: code,
                message: message.into(),
            },
        }
    }

    /// Vérifie si l'erreur est un refus d'authentification
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SpotifyError::Auth(_))
    }

    /// Erreur qu'une nouvelle tentative de connexion ne corrigera pas :
    /// refus d'authentification ou configuration invalide
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpotifyError::Auth(_) | SpotifyError::Config(_))
    }

    /// Vérifie si l'erreur signifie que la connexion sous-jacente est perdue
    ///
    /// C'est le cas d'un échec de transport (connexion refusée, coupée,
    /// timeout) ou d'un token révoqué par le service (401).
    pub fn is_connection_lost(&self) -> bool {
        match self {
            SpotifyError::Http(e) => e.is_connect() || e.is_timeout(),
            SpotifyError::RemoteService { status: 401, .. } => true,
            _ => false,
        }
    }

    /// Classification de gravité utilisée à la frontière des résolveurs
    pub fn severity(&self) -> Severity {
        match self {
            SpotifyError::InvalidIdentifier(_)
            | SpotifyError::UnsupportedSimilarTarget(_)
            | SpotifyError::SessionUnavailable
            | SpotifyError::NotFound(_)
            | SpotifyError::NoAudioFile(_) => Severity::Common,
            SpotifyError::RemoteService { .. }
            | SpotifyError::Malformed(_)
            | SpotifyError::UnsupportedFormat(_)
            | SpotifyError::Http(_)
            | SpotifyError::Json(_) => Severity::Suspicious,
            SpotifyError::Auth(_)
            | SpotifyError::Io(_)
            | SpotifyError::Config(_)
            | SpotifyError::Other(_) => Severity::Fault,
        }
    }
}

/// Gravité d'un échec de résolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Condition attendue, présentable à l'utilisateur (id invalide, résultat vide)
    Common,
    /// Réponse distante inattendue
    Suspicious,
    /// Bug interne
    Fault,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Common => "COMMON",
            Severity::Suspicious => "SUSPICIOUS",
            Severity::Fault => "FAULT",
        })
    }
}

/// Unique erreur exposée par les résolveurs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ResolveError {
    pub message: String,
    pub severity: Severity,
}

impl ResolveError {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

impl From<SpotifyError> for ResolveError {
    fn from(e: SpotifyError) -> Self {
        Self {
            severity: e.severity(),
            message: e.to_string(),
        }
    }
}
