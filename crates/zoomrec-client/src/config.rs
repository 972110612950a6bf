//! Client configuration.
//!
//! Settings come from, highest priority first: command-line flags (and the
//! environment variables bound to them), `config.toml`, then built-in
//! defaults. The file lives at `~/.config/zoom-recordings/config.toml` by
//! default:
//!
//! ```toml
//! [zoom]
//! client_id = "..."
//! client_secret = "..."
//! callback_port = 8085
//! token_path = "/home/me/.zoom-recordings/token.json"
//! api_base_url = "https://api.zoom.us/v2"
//!
//! [download]
//! output_dir = "/srv/recordings"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zoomrec_api::config::{
    DEFAULT_API_BASE_URL, DEFAULT_AUTHORIZE_URL, DEFAULT_CALLBACK_PORT, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TOKEN_URL,
};
use zoomrec_api::{OAuthConfig, OAuthCredentials, TokenStore};

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

/// How long `login` waits for the browser to come back.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Zoom app and API settings.
    pub zoom: ZoomSettings,

    /// Download settings.
    pub download: DownloadSettings,
}

/// `[zoom]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    /// OAuth client ID.
    pub client_id: Option<String>,

    /// OAuth client secret.
    pub client_secret: Option<String>,

    /// Local port for the OAuth redirect.
    pub callback_port: Option<u16>,

    /// Path to token storage.
    pub token_path: Option<PathBuf>,

    /// REST API base URL.
    pub api_base_url: Option<String>,
}

/// `[download]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory recordings are saved to.
    pub output_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Loads configuration from the default path, if the file exists.
    pub fn load() -> Result<Self, String> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Parses `config.toml` content.
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zoom-recordings").join("config.toml"))
    }
}

// ---------------------------------------------------------------------------
// Settings (resolved)
// ---------------------------------------------------------------------------

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// OAuth client credentials, if configured anywhere.
    pub credentials: Option<OAuthCredentials>,
    pub callback_port: u16,
    pub token_path: PathBuf,
    pub api_base_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub callback_timeout: Duration,
}

impl Settings {
    /// Merges command-line flags over `config.toml` over defaults.
    pub fn resolve(cli: &Cli, config: &ClientConfig) -> ClientResult<Self> {
        let zoom = &config.zoom;

        let client_id = non_blank(cli.client_id.as_ref()).or(non_blank(zoom.client_id.as_ref()));
        let client_secret =
            non_blank(cli.client_secret.as_ref()).or(non_blank(zoom.client_secret.as_ref()));
        let credentials = match (client_id, client_secret) {
            (Some(id), Some(secret)) => Some(OAuthCredentials::new(id, secret)),
            _ => None,
        };

        let token_path = match cli.token_path.clone().or_else(|| zoom.token_path.clone()) {
            Some(path) => path,
            None => TokenStore::default_path()?,
        };

        Ok(Self {
            credentials,
            callback_port: cli
                .callback_port
                .or(zoom.callback_port)
                .unwrap_or(DEFAULT_CALLBACK_PORT),
            token_path,
            api_base_url: zoom
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            output_dir: config
                .download
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
        })
    }

    /// Builds the OAuth configuration; fails if credentials are missing.
    pub fn oauth_config(&self) -> ClientResult<OAuthConfig> {
        let credentials = self.credentials.clone().ok_or_else(|| {
            ClientError::Config(
                "missing Zoom client credentials: use --client-id/--client-secret, \
                 ZOOM_CLIENT_ID/ZOOM_CLIENT_SECRET, or the [zoom] section of config.toml"
                    .to_string(),
            )
        })?;

        Ok(OAuthConfig::new(credentials)
            .with_callback_port(self.callback_port)
            .with_authorize_url(&self.authorize_url)
            .with_token_url(&self.token_url)
            .with_request_timeout(self.request_timeout))
    }

    /// The token store at the configured path.
    pub fn token_store(&self) -> TokenStore {
        TokenStore::new(&self.token_path)
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}
