//! Session authentifiée auprès de Spotify
//!
//! [`SpotifySession`] est une poignée clonable et partageable entre tâches.
//! Une tâche de supervision unique possède le cycle de vie de la connexion :
//! lorsqu'une perte est signalée, elle attend `reconnect_delay` puis retente
//! indéfiniment jusqu'au succès, jusqu'à un refus d'authentification (fatal)
//! ou jusqu'à [`SpotifySession::close`].
//!
//! ```text
//! DISCONNECTED → CONNECTING → CONNECTED → CLOSING
//!      ↑______________________________|  (perte inattendue)
//! ```
//!
//! Tant que la session n'est pas `CONNECTED`, les appels échouent
//! immédiatement avec `SpotifyError::SessionUnavailable`.

pub mod connection;

pub use connection::{Connection, Connector, HttpConnection, HttpConnector};

use crate::api::content::ContentStream;
use crate::api::{Endpoints, ProxyConfig};
use crate::error::{Result, SpotifyError};
use crate::id::{EntityType, PlayableId, SpotifyId};
use crate::models::{EntityMetadata, LyricsResponse, PlaylistPage, RadioSeed, SearchResults};
use crate::quality::{AudioQualityPicker, RemoteFile};
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Délai par défaut avant une tentative de reconnexion
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Paramètres de connexion
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Fichier de credentials réutilisables, prioritaire s'il existe
    pub credentials_file: PathBuf,
    /// Réécrit les credentials renvoyés après un login réussi
    pub store_credentials: bool,
    pub reconnect_delay: Duration,
    pub proxy: Option<ProxyConfig>,
    pub endpoints: Endpoints,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            credentials_file: PathBuf::from("credentials.json"),
            store_credentials: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            proxy: None,
            endpoints: Endpoints::default(),
        }
    }
}

/// État de la session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Fermeture demandée, état terminal
    Closing,
}

/// Contenu ouvert : le fichier retenu et son flux
pub struct ContentFeed {
    pub file: RemoteFile,
    pub stream: ContentStream,
}

impl std::fmt::Debug for ContentFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFeed").field("file", &self.file).finish_non_exhaustive()
    }
}

struct Slot {
    state: SessionState,
    connection: Option<Arc<dyn Connection>>,
    /// Incrémenté à chaque connexion, écarte les signalements périmés
    generation: u64,
    auth_failure: Option<String>,
}

struct SessionInner {
    connector: Arc<dyn Connector>,
    reconnect_delay: Duration,
    slot: RwLock<Slot>,
    /// Au plus une reconnexion en cours
    reconnect_pending: AtomicBool,
    loss_notify: Arc<Notify>,
    stop_token: CancellationToken,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.stop_token.cancel();
    }
}

/// Poignée sur la session Spotify
#[derive(Clone)]
pub struct SpotifySession {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SpotifySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifySession").finish_non_exhaustive()
    }
}

impl SpotifySession {
    /// Ouvre une session HTTP avec les paramètres donnés
    pub async fn connect_with_settings(settings: SessionSettings) -> Result<Self> {
        let delay = settings.reconnect_delay;
        Self::connect(Arc::new(HttpConnector::new(settings)), delay).await
    }

    /// Ouvre une session
    ///
    /// Le premier login est attendu. Un refus d'authentification ou une
    /// configuration inutilisable est renvoyé tel quel ; toute autre erreur
    /// laisse la session `DISCONNECTED` avec une reconnexion planifiée.
    pub async fn connect(connector: Arc<dyn Connector>, reconnect_delay: Duration) -> Result<Self> {
        let inner = Arc::new(SessionInner {
            connector,
            reconnect_delay,
            slot: RwLock::new(Slot {
                state: SessionState::Connecting,
                connection: None,
                generation: 0,
                auth_failure: None,
            }),
            reconnect_pending: AtomicBool::new(false),
            loss_notify: Arc::new(Notify::new()),
            stop_token: CancellationToken::new(),
            supervisor: Mutex::new(None),
        });

        let handle = tokio::spawn(supervise(
            Arc::downgrade(&inner),
            inner.stop_token.clone(),
            inner.loss_notify.clone(),
            reconnect_delay,
        ));
        if let Ok(mut guard) = inner.supervisor.lock() {
            *guard = Some(handle);
        }

        let session = Self { inner };

        match session.inner.connector.connect().await {
            Ok(connection) => {
                session.inner.install(connection).await;
                Ok(session)
            }
            Err(e) if e.is_fatal() => {
                error!("Spotify connection failed, not retrying: {}", e);
                session.close().await;
                Err(e)
            }
            Err(e) => {
                warn!("Initial Spotify connection failed: {}", e);
                session.inner.slot.write().await.state = SessionState::Disconnected;
                session.inner.schedule_reconnect();
                Ok(session)
            }
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.slot.read().await.state
    }

    /// Dernière erreur fatale (authentification, configuration) rencontrée en
    /// reconnexion
    pub async fn auth_failure(&self) -> Option<String> {
        self.inner.slot.read().await.auth_failure.clone()
    }

    /// Signale la perte de la connexion courante
    pub async fn connection_lost(&self) {
        let generation = self.inner.slot.read().await.generation;
        self.inner.report_loss(generation).await;
    }

    async fn with_connection<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn Connection>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (connection, generation) = {
            let slot = self.inner.slot.read().await;
            match (&slot.state, &slot.connection) {
                (SessionState::Connected, Some(connection)) => (connection.clone(), slot.generation),
                _ => return Err(SpotifyError::SessionUnavailable),
            }
        };

        let result = call(connection).await;
        if let Err(e) = &result {
            if e.is_connection_lost() {
                self.inner.report_loss(generation).await;
            }
        }
        result
    }

    pub async fn metadata(&self, kind: EntityType, id: &SpotifyId) -> Result<EntityMetadata> {
        let id = *id;
        self.with_connection(|c| async move { c.metadata(kind, &id).await })
            .await
    }

    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let query = query.to_string();
        self.with_connection(|c| async move { c.search(&query).await })
            .await
    }

    pub async fn radio_for_track(&self, id: &SpotifyId) -> Result<RadioSeed> {
        let id = *id;
        self.with_connection(|c| async move { c.radio_for_track(&id).await })
            .await
    }

    pub async fn playlist_page(&self, next: &str) -> Result<PlaylistPage> {
        let next = next.to_string();
        self.with_connection(|c| async move { c.playlist_page(&next).await })
            .await
    }

    pub async fn lyrics(&self, id: &SpotifyId) -> Result<Option<LyricsResponse>> {
        let id = *id;
        self.with_connection(|c| async move { c.lyrics(&id).await })
            .await
    }

    /// Ouvre le contenu d'une piste ou d'un épisode
    ///
    /// Le fichier est choisi par `picker` parmi ceux de la metadata.
    pub async fn open_content(
        &self,
        playable: PlayableId,
        picker: &dyn AudioQualityPicker,
    ) -> Result<ContentFeed> {
        let metadata = self.metadata(playable.kind(), &playable.id()).await?;
        let file = picker
            .get_file(metadata.audio_files())
            .ok_or_else(|| SpotifyError::NoAudioFile(playable.to_uri()))?;
        self.open_file(playable, file).await
    }

    /// Ouvre un fichier déjà choisi, sans relire la metadata
    pub async fn open_file(&self, playable: PlayableId, file: RemoteFile) -> Result<ContentFeed> {
        debug!("Opening {} with file {} ({:?})", playable, file.file_id, file.format);

        let opened = file.clone();
        let stream = self
            .with_connection(|c| async move { c.open_file(&opened).await })
            .await?;
        Ok(ContentFeed { file, stream })
    }

    /// Ferme la session
    ///
    /// Aucune reconnexion n'est tentée ensuite ; une attente de reconnexion
    /// en cours est annulée.
    pub async fn close(&self) {
        info!("Closing Spotify session");
        self.inner.stop_token.cancel();

        let connection = {
            let mut slot = self.inner.slot.write().await;
            slot.state = SessionState::Closing;
            slot.connection.take()
        };
        if let Some(connection) = connection {
            connection.close().await;
        }

        let handle = self.inner.supervisor.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl SessionInner {
    async fn install(&self, connection: Arc<dyn Connection>) -> bool {
        let mut slot = self.slot.write().await;
        if self.stop_token.is_cancelled() {
            drop(slot);
            connection.close().await;
            return false;
        }
        slot.state = SessionState::Connected;
        slot.connection = Some(connection);
        slot.generation += 1;
        info!("Spotify session connected");
        true
    }

    fn schedule_reconnect(&self) -> bool {
        if self
            .reconnect_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.loss_notify.notify_one();
        true
    }

    async fn report_loss(&self, generation: u64) {
        if self.stop_token.is_cancelled() {
            return;
        }

        let connection = {
            let mut slot = self.slot.write().await;
            if slot.generation != generation || slot.state != SessionState::Connected {
                return;
            }
            if !self.schedule_reconnect() {
                return;
            }
            slot.state = SessionState::Disconnected;
            slot.connection.take()
        };

        warn!(
            "Spotify connection lost, reconnecting in {}s",
            self.reconnect_delay.as_secs()
        );
        if let Some(connection) = connection {
            connection.close().await;
        }
    }

    /// Une tentative ; `Ok(true)` si connecté
    async fn attempt(&self) -> Result<bool> {
        {
            let mut slot = self.slot.write().await;
            if self.stop_token.is_cancelled() {
                return Ok(false);
            }
            slot.state = SessionState::Connecting;
        }

        let connection = tokio::select! {
            _ = self.stop_token.cancelled() => return Ok(false),
            result = self.connector.connect() => result,
        };

        match connection {
            Ok(connection) => Ok(self.install(connection).await),
            Err(e) => {
                let mut slot = self.slot.write().await;
                if slot.state == SessionState::Connecting {
                    slot.state = SessionState::Disconnected;
                }
                if e.is_fatal() {
                    slot.auth_failure = Some(e.to_string());
                }
                Err(e)
            }
        }
    }
}

/// Tâche de supervision : une boucle de reconnexion par perte signalée
///
/// Ne garde qu'une référence faible sur la session entre deux tentatives.
async fn supervise(
    session: Weak<SessionInner>,
    stop_token: CancellationToken,
    loss_notify: Arc<Notify>,
    delay: Duration,
) {
    loop {
        tokio::select! {
            _ = stop_token.cancelled() => return,
            _ = loss_notify.notified() => {},
        }

        let mut attempt = 0u64;
        loop {
            tokio::select! {
                _ = stop_token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {},
            }

            let Some(inner) = session.upgrade() else {
                return;
            };

            attempt += 1;
            info!("Spotify reconnect attempt #{}", attempt);

            match inner.attempt().await {
                Ok(true) => break,
                Ok(false) => return,
                Err(e) if e.is_fatal() => {
                    error!("Spotify reconnect failed, giving up: {}", e);
                    break;
                }
                Err(e) => {
                    warn!("Spotify reconnect attempt #{} failed: {}", attempt, e);
                }
            }
        }

        match session.upgrade() {
            Some(inner) => inner.reconnect_pending.store(false, Ordering::Release),
            None => return,
        }
    }
}
