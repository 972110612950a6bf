//! HTTP transport that keeps the OAuth credential fresh.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::{ZoomError, ZoomResult};
use crate::oauth::{http_client, OAuthClient};
use crate::tokens::Credential;

/// Sends bearer-authenticated requests, refreshing the credential first when
/// it is about to expire.
///
/// A refresh replaces the held credential. Callers check
/// [`was_refreshed`](Self::was_refreshed) or take
/// [`credential`](Self::credential) after a run to persist it.
#[derive(Debug)]
pub struct AuthenticatedTransport {
    http: reqwest::Client,
    request_timeout: Duration,
    /// `None` when no client credentials are configured.
    oauth: Option<OAuthClient>,
    credential: Credential,
    refreshed: bool,
}

impl AuthenticatedTransport {
    /// Wraps a credential loaded from the token store.
    pub fn new(oauth: OAuthClient, credential: Credential) -> Self {
        Self {
            http: oauth.http().clone(),
            request_timeout: oauth.config().request_timeout,
            oauth: Some(oauth),
            credential,
            refreshed: false,
        }
    }

    /// Wraps a credential that cannot be refreshed.
    ///
    /// Requests succeed while the access token is valid. Once it needs a
    /// refresh, every request fails with [`ZoomError::TokenRefreshFailed`].
    pub fn without_refresh(credential: Credential, request_timeout: Duration) -> ZoomResult<Self> {
        Ok(Self {
            http: http_client(request_timeout)?,
            request_timeout,
            oauth: None,
            credential,
            refreshed: false,
        })
    }

    /// The current credential, including any refresh performed so far.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Returns true if the credential was replaced by a refresh.
    pub fn was_refreshed(&self) -> bool {
        self.refreshed
    }

    /// The shared HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Refreshes the credential if it is expired and refreshable.
    pub async fn ensure_fresh(&mut self) -> ZoomResult<()> {
        if !self.credential.needs_refresh() {
            return Ok(());
        }
        let Some(refresh_token) = self.credential.refresh_token.clone() else {
            return Ok(());
        };
        let Some(oauth) = &self.oauth else {
            return Err(ZoomError::TokenRefreshFailed(Box::new(
                ZoomError::Configuration(
                    "client id and secret are required to refresh an expired token".to_string(),
                ),
            )));
        };

        debug!(expiry = ?self.credential.expiry, "access token expired, refreshing");
        let credential = oauth
            .refresh(&refresh_token)
            .await
            .map_err(|e| ZoomError::TokenRefreshFailed(Box::new(e)))?;
        self.credential = credential;
        self.refreshed = true;
        Ok(())
    }

    /// Returns a usable access token, refreshing first if needed.
    pub async fn access_token(&mut self) -> ZoomResult<String> {
        self.ensure_fresh().await?;
        Ok(self.credential.access_token.clone())
    }

    /// Sends an authenticated GET with the given query parameters.
    ///
    /// The response is returned whatever its status.
    pub async fn get<Q>(&mut self, url: &str, query: &Q) -> ZoomResult<reqwest::Response>
    where
        Q: Serialize + ?Sized,
    {
        self.ensure_fresh().await?;

        self.http
            .get(url)
            .bearer_auth(&self.credential.access_token)
            .query(query)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| ZoomError::network(format!("GET {url}"), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OAuthConfig, OAuthCredentials};
    use chrono::{Duration, Utc};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oauth(server: &MockServer) -> OAuthClient {
        let config = OAuthConfig::new(OAuthCredentials::new("client-id", "client-secret"))
            .with_token_url(format!("{}/oauth/token", server.uri()));
        OAuthClient::new(config).unwrap()
    }

    fn expired(refresh_token: Option<&str>) -> Credential {
        Credential {
            access_token: "old".into(),
            token_type: "bearer".into(),
            refresh_token: refresh_token.map(String::from),
            expiry: Some(Utc::now() - Duration::minutes(5)),
        }
    }

    #[tokio::test]
    async fn fresh_credential_is_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer at"))
            .and(query_param("a", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let credential = Credential::from_expires_in("at", "bearer", Some("rt".into()), Some(3600));
        let mut transport = AuthenticatedTransport::new(oauth(&server), credential);
        let response = transport
            .get(&format!("{}/users/me", server.uri()), &[("a", "1")])
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(!transport.was_refreshed());
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new",
                "token_type": "bearer",
                "refresh_token": "rt-2",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let mut transport = AuthenticatedTransport::new(oauth(&server), expired(Some("rt-1")));
        let url = format!("{}/users/me", server.uri());
        transport.get(&url, &[("a", "1")]).await.unwrap();
        transport.get(&url, &[("a", "1")]).await.unwrap();

        assert!(transport.was_refreshed());
        let credential = transport.credential();
        assert_eq!(credential.access_token, "new");
        assert_eq!(credential.refresh_token.as_deref(), Some("rt-2"));
    }

    #[tokio::test]
    async fn expired_credential_without_refresh_token_is_used_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let mut transport = AuthenticatedTransport::new(oauth(&server), expired(None));
        assert_eq!(transport.access_token().await.unwrap(), "old");
        assert!(!transport.was_refreshed());
    }

    #[tokio::test]
    async fn refresh_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid refresh token"))
            .mount(&server)
            .await;

        let mut transport = AuthenticatedTransport::new(oauth(&server), expired(Some("rt-1")));
        let err = transport.access_token().await.unwrap_err();
        assert!(matches!(err, ZoomError::TokenRefreshFailed(_)));
        assert!(err.requires_login());
        assert_eq!(transport.credential().access_token, "old");
    }

    #[tokio::test]
    async fn unrefreshable_transport_uses_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer at"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let credential = Credential::from_expires_in("at", "bearer", Some("rt".into()), Some(3600));
        let timeout = std::time::Duration::from_secs(5);
        let mut transport = AuthenticatedTransport::without_refresh(credential, timeout).unwrap();
        let response = transport
            .get(&format!("{}/users/me", server.uri()), &[("a", "1")])
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn unrefreshable_transport_rejects_expired_token() {
        let timeout = std::time::Duration::from_secs(5);
        let mut transport =
            AuthenticatedTransport::without_refresh(expired(Some("rt-1")), timeout).unwrap();
        let err = transport.access_token().await.unwrap_err();
        assert!(matches!(err, ZoomError::TokenRefreshFailed(_)));
        assert!(err.to_string().contains("client id and secret"));
        assert!(!transport.was_refreshed());
    }
}
