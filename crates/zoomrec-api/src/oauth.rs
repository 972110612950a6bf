//! Token endpoint client.
//!
//! Exchanges authorization codes and refresh tokens for access tokens.
//! Client authentication uses HTTP Basic, as Zoom requires.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::OAuthConfig;
use crate::error::{ZoomError, ZoomResult};
use crate::tokens::Credential;

/// A boxed future for async trait methods.
///
/// Keeps [`TokenExchanger`] object-safe so the callback responder can hold an
/// `Arc<dyn TokenExchanger>` and tests can substitute a double.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns an authorization code into a credential.
pub trait TokenExchanger: Send + Sync {
    /// Exchanges `code`, received on `redirect_uri`, for a credential.
    fn exchange<'a>(
        &'a self,
        code: &'a str,
        redirect_uri: &'a str,
    ) -> BoxFuture<'a, ZoomResult<Credential>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl From<TokenResponse> for Credential {
    fn from(response: TokenResponse) -> Self {
        Credential::from_expires_in(
            response.access_token,
            response.token_type,
            response.refresh_token,
            response.expires_in,
        )
    }
}

/// HTTP client for the OAuth token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Creates a client for the given configuration.
    pub fn new(config: OAuthConfig) -> ZoomResult<Self> {
        let http = http_client(config.request_timeout)?;
        Ok(Self { config, http })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Returns the underlying HTTP client for API and download requests.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Exchanges an authorization code for a credential.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> ZoomResult<Credential> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let credential = self.request_token(&params, "token exchange").await?;
        info!("obtained access token");
        Ok(credential)
    }

    /// Uses the refresh token to obtain a new access token.
    ///
    /// Zoom rotates refresh tokens; if the response carries none, the old
    /// one is kept.
    pub async fn refresh(&self, refresh_token: &str) -> ZoomResult<Credential> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let mut credential = self.request_token(&params, "token refresh").await?;
        if credential.refresh_token.is_none() {
            credential.refresh_token = Some(refresh_token.to_string());
        }
        info!("refreshed access token");
        Ok(credential)
    }

    async fn request_token(&self, params: &[(&str, &str)], what: &str) -> ZoomResult<Credential> {
        debug!(url = %self.config.token_url, "{what} request");

        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(
                &self.config.credentials.client_id,
                Some(&self.config.credentials.client_secret),
            )
            .timeout(self.config.request_timeout)
            .form(params)
            .send()
            .await
            .map_err(|e| ZoomError::network(format!("{what} request failed"), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ZoomError::network(format!("reading {what} response"), e))?;

        if !status.is_success() {
            return Err(ZoomError::remote_api(status, body));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ZoomError::decode(format!("{what} response"), e))?;
        Ok(token.into())
    }
}

/// Builds the HTTP client shared by token, API and download requests.
pub(crate) fn http_client(connect_timeout: Duration) -> ZoomResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!("zoom-recordings/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ZoomError::network("building HTTP client", e))
}

impl TokenExchanger for OAuthClient {
    fn exchange<'a>(
        &'a self,
        code: &'a str,
        redirect_uri: &'a str,
    ) -> BoxFuture<'a, ZoomResult<Credential>> {
        Box::pin(self.exchange_code(code, redirect_uri))
    }
}
