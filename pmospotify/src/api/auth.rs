//! Authentification : login, credentials stockés et tokens à portée

use super::SpotifyApi;
use crate::error::{Result, SpotifyError};
use chrono::{DateTime, TimeDelta, Utc};
use moka::Expiry;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use anyhow::anyhow;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Type d'authentification d'un blob de credentials réutilisables
pub const STORED_AUTH_TYPE: &str = "AUTHENTICATION_STORED_SPOTIFY_CREDENTIALS";

/// Marge retirée à la durée de vie d'un token avant de le renouveler
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// Durée maximale de conservation d'un token en cache
const MAX_TOKEN_CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

/// Date d'expiration à partir d'une durée renvoyée par le service
fn expiry_from_now(expires_in: u64) -> Result<DateTime<Utc>> {
    i64::try_from(expires_in)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or_else(|| SpotifyError::Malformed(format!("expires_in out of range: {}", expires_in)))
}

/// Credentials réutilisables, tels qu'écrits dans `credentials.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub username: String,
    pub auth_type: String,
    pub auth_data: String,
}

impl StoredCredentials {
    /// Lit le fichier s'il existe
    ///
    /// # Errors
    ///
    /// `SpotifyError::Config` si le fichier existe mais est illisible : ce
    /// n'est pas une erreur transitoire.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(SpotifyError::Config(anyhow!(
                    "cannot read credentials file {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        let creds = serde_json::from_str(&content).map_err(|e| {
            SpotifyError::Config(anyhow!("invalid credentials file {}: {}", path.display(), e))
        })?;
        debug!("Loaded stored credentials from {}", path.display());
        Ok(Some(creds))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_json::to_vec_pretty(self)?).await?;
        info!("Stored credentials written to {}", path.display());
        Ok(())
    }
}

/// Moyen d'authentification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    UserPass { username: String, password: String },
    Stored(StoredCredentials),
}

impl Credentials {
    pub fn username(&self) -> &str {
        match self {
            Credentials::UserPass { username, .. } => username,
            Credentials::Stored(stored) => &stored.username,
        }
    }

    fn form(&self) -> Vec<(&str, &str)> {
        match self {
            Credentials::UserPass { username, password } => {
                vec![("username", username.as_str()), ("password", password.as_str())]
            }
            Credentials::Stored(stored) => vec![
                ("username", stored.username.as_str()),
                ("auth_type", stored.auth_type.as_str()),
                ("auth_data", stored.auth_data.as_str()),
            ],
        }
    }
}

/// Réponse de `POST /api/login`
#[derive(Debug, Deserialize)]
struct LoginResponse {
    username: String,
    access_token: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    stored_credentials: Option<String>,
}

/// Informations d'une session authentifiée
#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub username: String,
    pub expires_at: DateTime<Utc>,
    /// Credentials réutilisables renvoyés par le service
    pub reusable: Option<StoredCredentials>,
}

/// Token d'accès à portée limitée
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// # Errors
    ///
    /// `SpotifyError::Malformed` si `expires_in` déborde
    pub fn new(token: impl Into<String>, expires_in: u64) -> Result<Self> {
        Ok(Self {
            token: token.into(),
            expires_in,
            expires_at: expiry_from_now(expires_in)?,
        })
    }

    /// Durée pendant laquelle le token peut être servi depuis le cache
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS))
            .min(MAX_TOKEN_CACHE_TTL)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

impl SpotifyApi {
    /// Authentifie la session
    ///
    /// # Errors
    ///
    /// * `SpotifyError::Auth` - credentials refusés (401/403)
    pub async fn login(&mut self, credentials: &Credentials) -> Result<AuthInfo> {
        info!("Attempting to login to Spotify as {}", credentials.username());

        let url = self.url(&self.endpoints().accounts, &["api", "login"])?;
        debug!("POST {}", url);
        let response = self
            .client()
            .post(url)
            .form(&credentials.form())
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            let text = response.text().await.unwrap_or_default();
            warn!("Login refused ({}): {}", status, text);
            return Err(SpotifyError::Auth(format!(
                "login refused for {}: {}",
                credentials.username(),
                text
            )));
        }

        let login: LoginResponse = self.handle_response(response).await?;
        let expires_at = expiry_from_now(login.expires_in)?;
        self.set_access_token(login.access_token);

        info!("✅ Logged in to Spotify as {}", login.username);

        Ok(AuthInfo {
            expires_at,
            reusable: login.stored_credentials.map(|blob| StoredCredentials {
                username: login.username.clone(),
                auth_type: STORED_AUTH_TYPE.to_string(),
                auth_data: blob,
            }),
            username: login.username,
        })
    }

    /// Demande un token à portée (ex: `playlist-read`)
    pub async fn scoped_token(&self, scope: &str) -> Result<AccessToken> {
        let mut url = self.url(
            &self.endpoints().accounts,
            &["keymaster", "token", "authenticated"],
        )?;
        url.query_pairs_mut().append_pair("scope", scope);

        let response: TokenResponse = self.get(url).await?;
        debug!("Got token for scope {} ({}s)", scope, response.expires_in);
        AccessToken::new(response.access_token, response.expires_in)
    }
}

struct TokenExpiry;

impl Expiry<String, AccessToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _scope: &String,
        token: &AccessToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(token.cache_ttl())
    }
}

/// Cache révocable des tokens, indexé par portée
#[derive(Clone)]
pub struct TokenCache {
    cache: Cache<String, AccessToken>,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(32)
                .expire_after(TokenExpiry)
                .build(),
        }
    }

    pub async fn get(&self, scope: &str) -> Option<AccessToken> {
        self.cache.get(scope).await
    }

    pub async fn insert(&self, scope: &str, token: AccessToken) {
        self.cache.insert(scope.to_string(), token).await;
    }

    /// Renvoie le token en cache ou le demande au service
    pub async fn get_or_fetch(&self, api: &SpotifyApi, scope: &str) -> Result<String> {
        if let Some(token) = self.get(scope).await {
            return Ok(token.token);
        }
        let token = api.scoped_token(scope).await?;
        self.insert(scope, token.clone()).await;
        Ok(token.token)
    }

    /// Révoque tous les tokens (fin de connexion)
    pub fn revoke_all(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stored_credentials_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("credentials.json");

        assert!(StoredCredentials::load(&path).await.unwrap().is_none());

        let creds = StoredCredentials {
            username: "alice".into(),
            auth_type: STORED_AUTH_TYPE.into(),
            auth_data: "blob".into(),
        };
        creds.save(&path).await.unwrap();
        assert_eq!(StoredCredentials::load(&path).await.unwrap(), Some(creds));
    }

    #[test]
    fn test_credentials_form() {
        let creds = Credentials::UserPass {
            username: "bob".into(),
            password: "secret".into(),
        };
        assert_eq!(creds.form(), vec![("username", "bob"), ("password", "secret")]);
    }

    #[test]
    fn test_token_ttl_margin() {
        assert_eq!(AccessToken::new("t", 3600).unwrap().cache_ttl(), Duration::from_secs(3540));
        assert_eq!(AccessToken::new("t", 10).unwrap().cache_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_token_expiry_out_of_range() {
        let err = AccessToken::new("t", u64::MAX).unwrap_err();
        assert!(matches!(err, SpotifyError::Malformed(_)));
        let err = AccessToken::new("t", i64::MAX as u64).unwrap_err();
        assert!(matches!(err, SpotifyError::Malformed(_)));

        // Une durée valide mais démesurée reste bornée dans le cache
        let token = AccessToken::new("t", 10 * 365 * 24 * 3600).unwrap();
        assert_eq!(token.cache_ttl(), MAX_TOKEN_CACHE_TTL);
    }

    #[tokio::test]
    async fn test_unreadable_credentials_file_is_config_error() {
        let dir = tempdir().unwrap();

        // Un répertoire à la place du fichier
        let path = dir.path().join("credentials.json");
        std::fs::create_dir(&path).unwrap();
        let err = StoredCredentials::load(&path).await.unwrap_err();
        assert!(matches!(err, SpotifyError::Config(_)));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        let err = StoredCredentials::load(&garbage).await.unwrap_err();
        assert!(matches!(err, SpotifyError::Config(_)));

        // Parent qui n'est pas un répertoire : fichier absent
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        assert!(StoredCredentials::load(&blocker.join("credentials.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_cache_revoke() {
        let cache = TokenCache::new();
        cache.insert("playlist-read", AccessToken::new("tok", 3600).unwrap()).await;
        assert_eq!(cache.get("playlist-read").await.unwrap().token, "tok");
        cache.revoke_all();
        assert!(cache.get("playlist-read").await.is_none());
    }
}
