//! Command implementations.

pub mod download;
pub mod list;
pub mod login;
pub mod logout;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zoomrec_api::{
    AuthenticatedTransport, Meeting, OAuthClient, RecordingsClient, TokenStore, ZoomError,
    ZoomResult,
};
use zoomrec_core::DateRange;

use crate::config::Settings;
use crate::error::ClientResult;

/// State shared by the `list` and `download` pipelines: the stored
/// credential wrapped in a refreshing transport.
pub(crate) struct Session {
    store: TokenStore,
    transport: AuthenticatedTransport,
    recordings: RecordingsClient,
}

impl Session {
    /// Loads the stored credential; fails with `NotAuthenticated` if there
    /// is none.
    ///
    /// Client credentials are only needed to refresh the token. Without them
    /// a still-valid stored token is used as is.
    pub(crate) fn open(settings: &Settings) -> ClientResult<Self> {
        let store = settings.token_store();
        let credential = store.load()?.ok_or(ZoomError::NotAuthenticated)?;
        debug!(path = %store.path().display(), "using stored token");

        let transport = if settings.credentials.is_some() {
            let oauth = OAuthClient::new(settings.oauth_config()?)?;
            AuthenticatedTransport::new(oauth, credential)
        } else {
            debug!("no client credentials configured, token will not be refreshed");
            AuthenticatedTransport::without_refresh(credential, settings.request_timeout)?
        };

        Ok(Self {
            store,
            transport,
            recordings: RecordingsClient::new(settings.api_base_url.clone()),
        })
    }

    pub(crate) async fn list(
        &mut self,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> ZoomResult<Vec<Meeting>> {
        self.recordings
            .list_recordings(&mut self.transport, range, cancel)
            .await
    }

    pub(crate) fn transport(&mut self) -> &mut AuthenticatedTransport {
        &mut self.transport
    }

    /// Writes the current credential back to the store.
    ///
    /// Failure only warns: the run itself already succeeded or failed on
    /// its own terms.
    pub(crate) fn persist_credential(&self) {
        match self.store.save(self.transport.credential()) {
            Ok(()) if self.transport.was_refreshed() => debug!("saved refreshed token"),
            Ok(()) => {}
            Err(e) => warn!(error = %e, "failed to save token"),
        }
    }
}
