//! OAuth 2.0 authorization-code flow with a loopback redirect.
//!
//! # Flow Overview
//!
//! 1. Generate a random `state` for CSRF protection
//! 2. Bind the callback listener on the configured local port
//! 3. Build the authorization URL and hand it to the browser
//! 4. The user approves; Zoom redirects to `http://localhost:{port}/oauth/callback`
//! 5. The responder checks `state`, exchanges the code and reports the result
//! 6. The listener is shut down whatever the outcome
//!
//! The caller's [`CancellationToken`] bounds the wait; login timeouts are
//! implemented by cancelling a child token.

use std::fmt;
use std::io;
use std::sync::Arc;

use rand::Rng as _;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::callback::CallbackServer;
use crate::config::OAuthConfig;
use crate::error::{ZoomError, ZoomResult};
use crate::oauth::{OAuthClient, TokenExchanger};
use crate::tokens::Credential;

/// Random bytes in the `state` parameter before hex encoding.
const STATE_BYTES: usize = 16;

/// Opens a URL for the user, normally in their browser.
pub trait UrlLauncher: Send + Sync {
    /// Opens `url`.
    fn launch(&self, url: &str) -> io::Result<()>;
}

/// Launches URLs with the desktop's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl UrlLauncher for SystemBrowser {
    fn launch(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}

impl<F> UrlLauncher for F
where
    F: Fn(&str) -> io::Result<()> + Send + Sync,
{
    fn launch(&self, url: &str) -> io::Result<()> {
        self(url)
    }
}

/// Generates an unpredictable hex `state` value.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Builds the provider authorization URL.
pub fn authorization_url(config: &OAuthConfig, state: &str, redirect_uri: &str) -> String {
    let separator = if config.authorize_url.contains('?') {
        '&'
    } else {
        '?'
    };
    let scope = config.scopes.join(" ");

    format!(
        "{}{}response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
        config.authorize_url,
        separator,
        urlencoding::encode(&config.credentials.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope),
        urlencoding::encode(state),
    )
}

/// One in-flight authorization attempt.
///
/// Holds the `state` sent to the provider, the bound callback port and the
/// two single-slot channels the responder reports on.
pub struct OAuthSession {
    state: String,
    port: u16,
    redirect_uri: String,
    credential_rx: oneshot::Receiver<Credential>,
    error_rx: oneshot::Receiver<ZoomError>,
}

enum Arrival {
    Credential(Result<Credential, RecvError>),
    Error(Result<ZoomError, RecvError>),
    Cancelled,
}

impl OAuthSession {
    pub(crate) fn new(
        state: String,
        port: u16,
        redirect_uri: String,
        credential_rx: oneshot::Receiver<Credential>,
        error_rx: oneshot::Receiver<ZoomError>,
    ) -> Self {
        Self {
            state,
            port,
            redirect_uri,
            credential_rx,
            error_rx,
        }
    }

    /// The anti-forgery `state` value.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// The local port the responder listens on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The redirect URI registered for this attempt.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Waits for a credential, a callback error or cancellation, whichever
    /// comes first.
    pub async fn wait(mut self, cancel: &CancellationToken) -> ZoomResult<Credential> {
        let arrival = tokio::select! {
            biased;
            _ = cancel.cancelled() => Arrival::Cancelled,
            result = &mut self.credential_rx => Arrival::Credential(result),
            result = &mut self.error_rx => Arrival::Error(result),
        };

        // The responder sends before dropping its senders, so a closed
        // channel means the value, if any, is already in the other one.
        match arrival {
            Arrival::Cancelled => Err(ZoomError::Cancelled),
            Arrival::Credential(Ok(credential)) => Ok(credential),
            Arrival::Error(Ok(error)) => Err(error),
            Arrival::Credential(Err(_)) => match self.error_rx.try_recv() {
                Ok(error) => Err(error),
                Err(_) => Err(responder_gone()),
            },
            Arrival::Error(Err(_)) => self.credential_rx.try_recv().map_err(|_| responder_gone()),
        }
    }
}

impl fmt::Debug for OAuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSession")
            .field("port", &self.port)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

fn responder_gone() -> ZoomError {
    ZoomError::Internal("callback responder stopped without a result".to_string())
}

/// Drives the authorization-code flow.
pub struct Authenticator {
    config: OAuthConfig,
    exchanger: Arc<dyn TokenExchanger>,
    launcher: Box<dyn UrlLauncher>,
}

impl Authenticator {
    /// Creates an authenticator that exchanges codes with the configured
    /// token endpoint and opens the system browser.
    pub fn new(config: OAuthConfig) -> ZoomResult<Self> {
        let client = OAuthClient::new(config.clone())?;
        Ok(Self::with_exchanger(config, Arc::new(client)))
    }

    /// Creates an authenticator with a custom code exchanger.
    pub fn with_exchanger(config: OAuthConfig, exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self {
            config,
            exchanger,
            launcher: Box::new(SystemBrowser),
        }
    }

    /// Replaces the URL launcher.
    #[must_use]
    pub fn with_launcher(mut self, launcher: impl UrlLauncher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Runs the flow until a credential is obtained, the callback reports an
    /// error or `cancel` fires.
    ///
    /// # Errors
    ///
    /// - [`ZoomError::ListenerBindFailed`] if the callback port is taken
    /// - [`ZoomError::CallbackStateMismatch`], [`ZoomError::CallbackMissingCode`]
    ///   or [`ZoomError::AuthorizationDenied`] for a bad redirect
    /// - [`ZoomError::TokenExchangeFailed`] if the code exchange fails
    /// - [`ZoomError::Cancelled`] if `cancel` fires first
    pub async fn authenticate(&self, cancel: &CancellationToken) -> ZoomResult<Credential> {
        self.config.validate()?;

        let state = generate_state();
        let (mut server, session) =
            CallbackServer::start(self.config.callback_port, state, Arc::clone(&self.exchanger))
                .await?;

        let url = authorization_url(&self.config, session.state(), session.redirect_uri());
        info!(port = session.port(), "waiting for OAuth callback");
        eprintln!("Open this URL in your browser to authorize:\n\n  {url}\n");
        if let Err(e) = self.launcher.launch(&url) {
            warn!(error = %e, "failed to open browser");
        }

        let result = session.wait(cancel).await;
        server.shutdown().await;

        match &result {
            Ok(_) => debug!("authorization complete"),
            Err(e) => debug!(error = %e, "authorization failed"),
        }
        result
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
