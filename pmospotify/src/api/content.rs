//! Accès au contenu audio : résolution du stockage puis téléchargement CDN

use super::SpotifyApi;
use crate::error::{Result, SpotifyError};
use crate::quality::RemoteFile;
use futures::TryStreamExt;
use serde::Deserialize;
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::debug;

/// Flux d'octets en lecture seule, sans seek
pub type ContentStream = Pin<Box<dyn AsyncRead + Send>>;

/// Réponse de storage-resolve
#[derive(Debug, Deserialize)]
struct StorageResolveResponse {
    #[serde(default)]
    result: String,
    #[serde(default)]
    cdnurl: Vec<String>,
}

impl SpotifyApi {
    /// URL CDN d'un fichier audio
    pub async fn resolve_storage(&self, file: &RemoteFile) -> Result<String> {
        let mut url = self.url(
            &self.endpoints().spclient,
            &["storage-resolve", "files", "audio", "interactive", &file.file_id],
        )?;
        url.query_pairs_mut().append_pair("alt", "json");

        let response: StorageResolveResponse = self.get(url).await?;
        if response.result != "CDN" {
            return Err(SpotifyError::Malformed(format!(
                "storage-resolve returned '{}' for file {}",
                response.result, file.file_id
            )));
        }

        response.cdnurl.into_iter().next().ok_or_else(|| {
            SpotifyError::Malformed(format!("no CDN url for file {}", file.file_id))
        })
    }

    /// Ouvre le fichier en streaming
    pub async fn open_file(&self, file: &RemoteFile) -> Result<ContentStream> {
        let cdn_url = self.resolve_storage(file).await?;
        debug!("Streaming file {} from {}", file.file_id, cdn_url);

        let response = self.client().get(&cdn_url).send().await?;
        let response = Self::check_status(response).await?;

        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(body)))
    }
}
