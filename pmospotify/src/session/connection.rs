//! Connexion au service, derrière deux traits
//!
//! [`Connector`] établit une connexion authentifiée, [`Connection`] porte les
//! appels du catalogue. [`HttpConnector`] est l'implémentation réelle ; les
//! tests injectent leurs propres implémentations.

use crate::api::auth::{Credentials, StoredCredentials, TokenCache};
use crate::api::catalog::PLAYLIST_READ_SCOPE;
use crate::api::content::ContentStream;
use crate::api::SpotifyApi;
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, SpotifyId};
use crate::models::{EntityMetadata, LyricsResponse, PlaylistPage, RadioSeed, SearchResults};
use crate::quality::RemoteFile;
use crate::session::SessionSettings;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fabrique de connexions authentifiées
#[async_trait]
pub trait Connector: Send + Sync {
    /// Établit une connexion
    ///
    /// # Errors
    ///
    /// `SpotifyError::Auth` si les credentials sont refusés,
    /// `SpotifyError::Config` si la configuration est inutilisable ; toute
    /// autre erreur est considérée transitoire.
    async fn connect(&self) -> Result<Arc<dyn Connection>>;
}

/// Connexion établie
#[async_trait]
pub trait Connection: Send + Sync {
    async fn metadata(&self, kind: EntityType, id: &SpotifyId) -> Result<EntityMetadata>;

    async fn playlist_page(&self, next: &str) -> Result<PlaylistPage>;

    async fn search(&self, query: &str) -> Result<SearchResults>;

    async fn radio_for_track(&self, id: &SpotifyId) -> Result<RadioSeed>;

    async fn lyrics(&self, id: &SpotifyId) -> Result<Option<LyricsResponse>>;

    async fn open_file(&self, file: &RemoteFile) -> Result<ContentStream>;

    /// Libère la connexion et révoque ses tokens
    async fn close(&self);
}

/// Connecteur HTTP/JSON
pub struct HttpConnector {
    settings: SessionSettings,
}

impl HttpConnector {
    pub fn new(settings: SessionSettings) -> Self {
        Self { settings }
    }

    /// Credentials stockés si le fichier existe, sinon username/password
    async fn credentials(&self) -> Result<Credentials> {
        if let Some(stored) = StoredCredentials::load(&self.settings.credentials_file).await? {
            return Ok(Credentials::Stored(stored));
        }

        match (&self.settings.username, &self.settings.password) {
            (Some(username), Some(password)) => Ok(Credentials::UserPass {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(SpotifyError::Auth(format!(
                "no credentials: {} not found and no username/password configured",
                self.settings.credentials_file.display()
            ))),
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self) -> Result<Arc<dyn Connection>> {
        let mut api = SpotifyApi::new(self.settings.endpoints.clone(), self.settings.proxy.as_ref())?;
        let credentials = self.credentials().await?;
        let auth = api.login(&credentials).await?;

        if self.settings.store_credentials {
            if let Some(reusable) = &auth.reusable {
                // Le login a réussi : un échec d'écriture ne fait pas tomber la connexion
                if let Err(e) = reusable.save(&self.settings.credentials_file).await {
                    warn!(
                        "Could not store Spotify credentials to {}: {}",
                        self.settings.credentials_file.display(),
                        e
                    );
                }
            }
        }

        info!("Spotify connection ready for {} (token valid until {})", auth.username, auth.expires_at);

        Ok(Arc::new(HttpConnection {
            api,
            tokens: TokenCache::new(),
        }))
    }
}

/// Connexion HTTP authentifiée
pub struct HttpConnection {
    api: SpotifyApi,
    tokens: TokenCache,
}

impl HttpConnection {
    async fn playlist_token(&self) -> Result<String> {
        self.tokens.get_or_fetch(&self.api, PLAYLIST_READ_SCOPE).await
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn metadata(&self, kind: EntityType, id: &SpotifyId) -> Result<EntityMetadata> {
        match kind {
            EntityType::Playlist => {
                let token = self.playlist_token().await?;
                Ok(EntityMetadata::Playlist(self.api.get_playlist(id, &token).await?))
            }
            _ => self.api.get_metadata(kind, id).await,
        }
    }

    async fn playlist_page(&self, next: &str) -> Result<PlaylistPage> {
        let token = self.playlist_token().await?;
        self.api.get_playlist_page(next, &token).await
    }

    async fn search(&self, query: &str) -> Result<SearchResults> {
        self.api.search(query).await
    }

    async fn radio_for_track(&self, id: &SpotifyId) -> Result<RadioSeed> {
        self.api.radio_for_track(id).await
    }

    async fn lyrics(&self, id: &SpotifyId) -> Result<Option<LyricsResponse>> {
        self.api.lyrics(id).await
    }

    async fn open_file(&self, file: &RemoteFile) -> Result<ContentStream> {
        self.api.open_file(file).await
    }

    async fn close(&self) {
        debug!("Revoking cached tokens");
        self.tokens.revoke_all();
    }
}

impl Drop for HttpConnection {
    fn drop(&mut self) {
        self.tokens.revoke_all();
    }
}
