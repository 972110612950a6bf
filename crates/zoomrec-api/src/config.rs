//! OAuth client configuration.

use std::fmt;
use std::time::Duration;

use crate::error::{ZoomError, ZoomResult};

/// Zoom REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.zoom.us/v2";

/// Zoom OAuth authorization endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://zoom.us/oauth/authorize";

/// Zoom OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://zoom.us/oauth/token";

/// Default local port for the OAuth redirect listener.
pub const DEFAULT_CALLBACK_PORT: u16 = 8085;

/// Path the local listener serves the OAuth redirect on.
pub const CALLBACK_PATH: &str = "/oauth/callback";

/// Scopes needed to list recordings and their files.
pub const DEFAULT_SCOPES: &[&str] = &[
    "cloud_recording:read:list_user_recordings",
    "cloud_recording:read:list_recording_files",
];

/// Default timeout for API and token requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth 2.0 client credentials for a Zoom app.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The OAuth client ID from the Zoom App Marketplace.
    pub client_id: String,
    /// The OAuth client secret from the Zoom App Marketplace.
    pub client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Checks that both halves of the credentials are present.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.trim().is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.trim().is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

// The secret never ends up in logs.
impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Everything the OAuth flow and token refresh need to reach the provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Client credentials.
    pub credentials: OAuthCredentials,
    /// Local port the redirect listener binds. `0` picks a free port.
    pub callback_port: u16,
    /// Authorization endpoint the browser is sent to.
    pub authorize_url: String,
    /// Token endpoint for code exchange and refresh.
    pub token_url: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Timeout applied to token and API requests.
    pub request_timeout: Duration,
}

impl OAuthConfig {
    /// Creates a configuration with Zoom's endpoints and default scopes.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            callback_port: DEFAULT_CALLBACK_PORT,
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the local callback port.
    #[must_use]
    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    /// Sets the authorization endpoint.
    #[must_use]
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    /// Sets the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Redirect URI registered with the provider for a listener on `port`.
    pub fn redirect_uri_for(port: u16) -> String {
        format!("http://localhost:{port}{CALLBACK_PATH}")
    }

    /// Validates credentials and endpoint URLs.
    pub fn validate(&self) -> ZoomResult<()> {
        self.credentials
            .validate()
            .map_err(|e| ZoomError::Configuration(e.to_string()))?;
        for (name, value) in [
            ("authorize_url", &self.authorize_url),
            ("token_url", &self.token_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ZoomError::Configuration(format!("{name} '{value}': {e}")))?;
        }
        if self.scopes.is_empty() {
            return Err(ZoomError::Configuration(
                "at least one scope is required".into(),
            ));
        }
        Ok(())
    }
}
