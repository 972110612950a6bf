//! `login`: run the OAuth flow and store the token.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;
use zoomrec_api::{Authenticator, Credential, ZoomError};

use crate::config::Settings;
use crate::error::{ClientError, ClientResult};

/// Authorizes with Zoom in the browser and saves the resulting token.
pub async fn run(settings: &Settings, cancel: &CancellationToken) -> ClientResult<()> {
    let authenticator = Authenticator::new(settings.oauth_config()?)?;

    info!("starting Zoom OAuth authentication");
    let credential =
        authenticate_with_timeout(&authenticator, settings.callback_timeout, cancel).await?;

    let store = settings.token_store();
    store.save(&credential)?;

    info!("authentication successful, token saved");
    println!("Authentication successful!");
    println!("Token saved to {}", store.path().display());
    Ok(())
}

/// Runs the flow, cancelling it if no callback arrives within `timeout`.
///
/// The attempt runs on a child of `cancel`, so Ctrl-C still reports
/// [`ZoomError::Cancelled`] while the timer reports a timeout.
pub async fn authenticate_with_timeout(
    authenticator: &Authenticator,
    timeout: Duration,
    cancel: &CancellationToken,
) -> ClientResult<Credential> {
    let attempt = cancel.child_token();
    let timer = {
        let attempt = attempt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            attempt.cancel();
        })
    };

    let result = authenticator.authenticate(&attempt).await;
    timer.abort();

    match result {
        Err(ZoomError::Cancelled) if !cancel.is_cancelled() => Err(ClientError::Timeout(format!(
            "no OAuth callback received within {}s",
            timeout.as_secs()
        ))),
        other => Ok(other?),
    }
}
