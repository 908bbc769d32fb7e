//! Adaptateur de lecture d'une piste résolue
//!
//! Au démarrage de la lecture, l'adaptateur récupère la metadata, négocie le
//! fichier à lire puis ouvre un flux d'octets étiqueté avec son conteneur.
//! Le flux est en lecture avant uniquement.

use crate::api::content::ContentStream;
use crate::error::{Result, SpotifyError};
use crate::id::PlayableId;
use crate::models::TrackDescriptor;
use crate::quality::{self, AudioQuality, AudioQualityPicker, CodecOnlyQuality, ContainerFormat, RemoteFile};
use crate::session::SpotifySession;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tracing::{debug, info, warn};

/// Piste Spotify prête à être ouverte
#[derive(Clone)]
pub struct SpotifyAudioTrack {
    descriptor: TrackDescriptor,
    session: SpotifySession,
    preferred: AudioQuality,
}

impl SpotifyAudioTrack {
    pub fn new(descriptor: TrackDescriptor, session: SpotifySession, preferred: AudioQuality) -> Self {
        Self {
            descriptor,
            session,
            preferred,
        }
    }

    pub fn descriptor(&self) -> &TrackDescriptor {
        &self.descriptor
    }

    /// Piste ou épisode, d'après la forme de l'URL canonique
    pub fn playable_id(&self) -> Result<PlayableId> {
        PlayableId::from_canonical_url(&self.descriptor.uri, &self.descriptor.identifier)
    }

    /// Nouvel adaptateur indépendant pour le même descripteur
    pub fn shallow_clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.shallow_clone(),
            session: self.session.clone(),
            preferred: self.preferred,
        }
    }

    /// Négocie le fichier et ouvre le flux
    pub async fn open(&self) -> Result<TaggedStream> {
        let playable = self.playable_id()?;
        let metadata = self.session.metadata(playable.kind(), &playable.id()).await?;

        let files = metadata.audio_files();

        let file = match quality::pick(files, self.preferred) {
            Some(file) => {
                debug!("Negotiated {:?} for {}", file.format, playable);
                file
            }
            None => {
                warn!(
                    "No negotiated file for {}, falling back to Vorbis {}",
                    playable, self.preferred
                );
                CodecOnlyQuality::vorbis(self.preferred)
                    .get_file(files)
                    .ok_or_else(|| SpotifyError::NoAudioFile(playable.to_uri()))?
            }
        };

        // La metadata est déjà là : on ouvre directement le fichier choisi
        let feed = self.session.open_file(playable, file).await?;

        let container = ContainerFormat::try_from(feed.file.codec().unwrap_or(quality::Codec::Other))?;
        info!(
            "Streaming '{}' ({}) as {:?} ({})",
            self.descriptor.title,
            playable,
            container,
            container.mime_type()
        );

        Ok(TaggedStream {
            container,
            file: feed.file,
            inner: feed.stream,
        })
    }
}

impl std::fmt::Debug for SpotifyAudioTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyAudioTrack")
            .field("descriptor", &self.descriptor)
            .field("preferred", &self.preferred)
            .finish_non_exhaustive()
    }
}

/// Flux d'octets étiqueté avec son conteneur, sans seek
pub struct TaggedStream {
    container: ContainerFormat,
    file: RemoteFile,
    inner: ContentStream,
}

impl TaggedStream {
    pub fn container(&self) -> ContainerFormat {
        self.container
    }

    pub fn file(&self) -> &RemoteFile {
        &self.file
    }
}

impl AsyncRead for TaggedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.get_mut().inner.as_mut().poll_read(cx, buf)
    }
}
