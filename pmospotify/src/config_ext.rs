//! Extension pour intégrer la configuration Spotify dans pmoconfig
//!
//! Les clés vivent sous `accounts.spotify` :
//!
//! ```yaml
//! accounts:
//!   spotify:
//!     username: ""
//!     password: ""
//!     credentials_file: credentials.json
//!     store_credentials: true
//!     audio_quality: normal
//!     allow_search: true
//!     playlist_load_limit: 6
//!     reconnect_delay_secs: 10
//!     proxy: { enabled: false, address: "", port: 8080, type: http }
//! ```

use crate::api::{Endpoints, ProxyConfig, ProxyType};
use crate::quality::AudioQuality;
use crate::session::SessionSettings;
use crate::source::SourceOptions;
use anyhow::{Result, anyhow};
use pmoconfig::Config;
use serde_yaml::Value;
use std::path::PathBuf;
use std::time::Duration;

const ROOT: [&str; 2] = ["accounts", "spotify"];

fn key<'a>(parts: &[&'a str]) -> Vec<&'a str> {
    ROOT.iter().copied().chain(parts.iter().copied()).collect()
}

/// Trait d'extension pour gérer la configuration Spotify dans pmoconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::Config;
/// use pmospotify::{SessionSettings, SpotifyConfigExt};
///
/// let config = Config::load_config("")?;
/// let settings = SessionSettings::from_config(&config)?;
/// ```
pub trait SpotifyConfigExt {
    /// Nom d'utilisateur, `None` si non configuré
    fn get_spotify_username(&self) -> Option<String>;

    fn set_spotify_username(&self, username: &str) -> Result<()>;

    fn get_spotify_password(&self) -> Option<String>;

    fn set_spotify_password(&self, password: &str) -> Result<()>;

    /// Fichier de credentials stockés, relatif au répertoire de config
    fn get_spotify_credentials_file(&self) -> PathBuf;

    fn get_spotify_store_credentials(&self) -> bool;

    /// Palier de qualité préféré
    ///
    /// # Errors
    ///
    /// Valeur inconnue (ni `normal`, ni `high`, ni `very_high`)
    fn get_spotify_audio_quality(&self) -> Result<AudioQuality>;

    fn set_spotify_audio_quality(&self, quality: AudioQuality) -> Result<()>;

    fn get_spotify_allow_search(&self) -> bool;

    /// Nombre maximal de pages de continuation, 0 = illimité
    fn get_spotify_playlist_load_limit(&self) -> usize;

    fn get_spotify_reconnect_delay(&self) -> Duration;

    /// Proxy, `None` s'il est désactivé
    fn get_spotify_proxy(&self) -> Result<Option<ProxyConfig>>;

    fn get_spotify_endpoints(&self) -> Endpoints;
}

impl SpotifyConfigExt for Config {
    fn get_spotify_username(&self) -> Option<String> {
        self.get_string(&key(&["username"]))
    }

    fn set_spotify_username(&self, username: &str) -> Result<()> {
        self.set_value(&key(&["username"]), Value::String(username.to_string()))
    }

    fn get_spotify_password(&self) -> Option<String> {
        self.get_string(&key(&["password"]))
    }

    fn set_spotify_password(&self, password: &str) -> Result<()> {
        self.set_value(&key(&["password"]), Value::String(password.to_string()))
    }

    fn get_spotify_credentials_file(&self) -> PathBuf {
        let file = self
            .get_string(&key(&["credentials_file"]))
            .unwrap_or_else(|| "credentials.json".to_string());
        self.resolve_path(&file)
    }

    fn get_spotify_store_credentials(&self) -> bool {
        self.get_bool(&key(&["store_credentials"]), true)
    }

    fn get_spotify_audio_quality(&self) -> Result<AudioQuality> {
        match self.get_string(&key(&["audio_quality"])) {
            Some(s) => s.parse().map_err(|e| anyhow!("{}", e)),
            None => Ok(AudioQuality::default()),
        }
    }

    fn set_spotify_audio_quality(&self, quality: AudioQuality) -> Result<()> {
        self.set_value(
            &key(&["audio_quality"]),
            Value::String(quality.to_string().to_lowercase()),
        )
    }

    fn get_spotify_allow_search(&self) -> bool {
        self.get_bool(&key(&["allow_search"]), true)
    }

    fn get_spotify_playlist_load_limit(&self) -> usize {
        self.get_u64(&key(&["playlist_load_limit"]), 6) as usize
    }

    fn get_spotify_reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.get_u64(&key(&["reconnect_delay_secs"]), 10))
    }

    fn get_spotify_proxy(&self) -> Result<Option<ProxyConfig>> {
        if !self.get_bool(&key(&["proxy", "enabled"]), false) {
            return Ok(None);
        }

        let address = self
            .get_string(&key(&["proxy", "address"]))
            .ok_or_else(|| anyhow!("Spotify proxy enabled but no address configured"))?;
        let port = u16::try_from(self.get_u64(&key(&["proxy", "port"]), 8080))
            .map_err(|_| anyhow!("Spotify proxy port out of range"))?;
        let kind = match self.get_string(&key(&["proxy", "type"])) {
            Some(s) => s.parse::<ProxyType>().map_err(|e| anyhow!("{}", e))?,
            None => ProxyType::default(),
        };

        Ok(Some(ProxyConfig {
            address,
            port,
            kind,
            username: self.get_string(&key(&["proxy", "username"])),
            password: self.get_string(&key(&["proxy", "password"])),
        }))
    }

    fn get_spotify_endpoints(&self) -> Endpoints {
        let defaults = Endpoints::default();
        let get = |name: &str, default: String| {
            self.get_string(&key(&["endpoints", name])).unwrap_or(default)
        };
        Endpoints {
            accounts: get("accounts", defaults.accounts),
            spclient: get("spclient", defaults.spclient),
            web_api: get("web_api", defaults.web_api),
            image_cdn: get("image_cdn", defaults.image_cdn),
        }
    }
}

impl SessionSettings {
    /// Paramètres de session depuis `accounts.spotify`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            username: config.get_spotify_username(),
            password: config.get_spotify_password(),
            credentials_file: config.get_spotify_credentials_file(),
            store_credentials: config.get_spotify_store_credentials(),
            reconnect_delay: config.get_spotify_reconnect_delay(),
            proxy: config.get_spotify_proxy()?,
            endpoints: config.get_spotify_endpoints(),
        })
    }
}

impl SourceOptions {
    /// Options de la source depuis `accounts.spotify`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            allow_search: config.get_spotify_allow_search(),
            playlist_load_limit: config.get_spotify_playlist_load_limit(),
            preferred_quality: config.get_spotify_audio_quality()?,
            image_cdn: config.get_spotify_endpoints().image_cdn,
        })
    }
}
