//! Couche d'accès HTTP aux services Spotify
//!
//! Ce module fournit une interface bas-niveau : authentification
//! ([`auth`]), catalogue ([`catalog`]) et contenu audio ([`content`]).
//! La logique de session (reconnexion, état) vit dans [`crate::session`].

pub mod auth;
pub mod catalog;
pub mod content;

use crate::error::{Result, SpotifyError};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Spotify/8.9.0 (PMOMusic)";

/// Délai d'établissement d'une connexion TCP/TLS
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Délai maximal entre deux lectures ; s'applique aussi aux flux CDN
const READ_TIMEOUT: Duration = Duration::from_secs(30);
/// Durée totale d'une requête JSON (login, metadata, storage-resolve...)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// URL de base des services utilisés
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Service d'authentification
    pub accounts: String,
    /// Metadata, recherche, radio, paroles, storage-resolve
    pub spclient: String,
    /// Web API (playlists)
    pub web_api: String,
    /// CDN des pochettes
    pub image_cdn: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            accounts: "https://accounts.spotify.com".into(),
            spclient: "https://spclient.wg.spotify.com".into(),
            web_api: "https://api.spotify.com/v1".into(),
            image_cdn: crate::models::DEFAULT_IMAGE_CDN.into(),
        }
    }
}

impl Endpoints {
    /// Toutes les URL pointant vers un même serveur (tests)
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            accounts: base.to_string(),
            spclient: base.to_string(),
            web_api: format!("{}/v1", base),
            image_cdn: format!("{}/image/", base),
        }
    }
}

/// Type de proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Http,
    Socks,
}

impl std::str::FromStr for ProxyType {
    type Err = SpotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "https" => Ok(ProxyType::Http),
            "socks" | "socks5" => Ok(ProxyType::Socks),
            other => Err(SpotifyError::Config(anyhow::anyhow!(
                "unknown proxy type '{}'",
                other
            ))),
        }
    }
}

/// Paramètres du proxy sortant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub address: String,
    pub port: u16,
    pub kind: ProxyType,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        let scheme = match self.kind {
            ProxyType::Http => "http",
            ProxyType::Socks => "socks5",
        };
        format!("{}://{}:{}", scheme, self.address, self.port)
    }

    fn to_reqwest(&self) -> Result<reqwest::Proxy> {
        let mut proxy = reqwest::Proxy::all(self.url())?;
        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            proxy = proxy.basic_auth(user, pass);
        }
        Ok(proxy)
    }
}

/// Client API bas-niveau pour communiquer avec Spotify
pub struct SpotifyApi {
    client: Client,
    endpoints: Endpoints,
    /// Token de la session, obtenu au login
    access_token: Option<String>,
    request_timeout: Duration,
}

impl SpotifyApi {
    /// Crée le client HTTP, le proxy est appliqué avant toute requête
    ///
    /// Le client n'a pas de délai total : les flux CDN sont lus au rythme de
    /// la lecture. Seules les requêtes JSON portent [`REQUEST_TIMEOUT`].
    pub fn new(endpoints: Endpoints, proxy: Option<&ProxyConfig>) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .user_agent(USER_AGENT);

        if let Some(proxy) = proxy {
            debug!("Using {:?} proxy {}:{}", proxy.kind, proxy.address, proxy.port);
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        Ok(Self {
            client: builder.build()?,
            endpoints,
            access_token: None,
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    #[cfg(test)]
    pub(crate) fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub(crate) fn set_access_token(&mut self, token: String) {
        self.access_token = Some(token);
    }

    /// Construit une URL en encodant chaque segment
    pub(crate) fn url(&self, base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base.trim_end_matches('/'))
            .map_err(|e| SpotifyError::Config(anyhow::anyhow!("invalid endpoint '{}': {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| SpotifyError::Config(anyhow::anyhow!("endpoint '{}' cannot be a base", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET authentifié avec le token de session
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let token = self.access_token.as_deref().ok_or(SpotifyError::SessionUnavailable)?;
        self.get_with_token(url, token).await
    }

    /// GET authentifié avec un token explicite (token à portée)
    pub(crate) async fn get_with_token<T: DeserializeOwned>(&self, url: Url, token: &str) -> Result<T> {
        let response = self.send(self.client.get(url.clone()).bearer_auth(token), &url).await?;
        self.handle_response(response).await
    }

    pub(crate) async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        debug!("GET {}", url);
        Ok(request
            .header("Accept", "application/json")
            .timeout(self.request_timeout)
            .send()
            .await?)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Traite la réponse HTTP
    pub(crate) async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            SpotifyError::Json(e)
        })
    }

    /// Transforme un statut d'échec en erreur
    pub(crate) async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        debug!("Response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_text = response.text().await.unwrap_or_default();
        warn!("API error ({}): {}", status_code, error_text);
        Err(SpotifyError::from_status_code(status_code, error_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_segments_are_encoded() {
        let api = SpotifyApi::new(Endpoints::default(), None).unwrap();
        let url = api
            .url("https://spclient.wg.spotify.com/", &["searchview", "km", "v4", "search", "daft punk/1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://spclient.wg.spotify.com/searchview/km/v4/search/daft%20punk%2F1"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let api = SpotifyApi::new(Endpoints::default(), None).unwrap();
        let url = api.url("https://api.spotify.com/v1", &["playlists", "abc"]).unwrap();
        assert_eq!(url.as_str(), "https://api.spotify.com/v1/playlists/abc");
    }

    #[test]
    fn test_proxy_url() {
        let proxy = ProxyConfig {
            address: "10.0.0.1".into(),
            port: 1080,
            kind: ProxyType::Socks,
            username: Some("u".into()),
            password: Some("p".into()),
        };
        assert_eq!(proxy.url(), "socks5://10.0.0.1:1080");
        assert!(SpotifyApi::new(Endpoints::default(), Some(&proxy)).is_ok());
        assert_eq!("SOCKS".parse::<ProxyType>().unwrap(), ProxyType::Socks);
        assert!("ftp".parse::<ProxyType>().is_err());
    }

    #[test]
    fn test_single_host_endpoints() {
        let e = Endpoints::single_host("http://127.0.0.1:1234/");
        assert_eq!(e.web_api, "http://127.0.0.1:1234/v1");
        assert_eq!(e.image_cdn, "http://127.0.0.1:1234/image/");
    }
}
