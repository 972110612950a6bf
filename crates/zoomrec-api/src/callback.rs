//! Loopback listener that receives the OAuth redirect.
//!
//! The responder accepts connections one at a time. Requests for other
//! paths are answered and ignored; the first request on the callback path
//! decides the outcome, which is sent on exactly one of the session's two
//! single-slot channels before the task exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::OAuthSession;
use crate::config::{CALLBACK_PATH, OAuthConfig};
use crate::error::{ZoomError, ZoomResult};
use crate::oauth::TokenExchanger;
use crate::tokens::Credential;

/// How long a connection may take to send its request head.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on header lines read per request.
const MAX_HEADER_LINES: usize = 100;

const SUCCESS_BODY: &str = "Authentication successful! You can close this window.";

/// Handle to the running responder task.
///
/// Dropping it aborts the task; [`CallbackServer::shutdown`] also waits for
/// the listener to be released.
#[derive(Debug)]
pub(crate) struct CallbackServer {
    port: u16,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Binds `127.0.0.1:port` and starts the responder.
    ///
    /// Port `0` binds a free port; the session reports the actual one.
    pub(crate) async fn start(
        port: u16,
        state: String,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> ZoomResult<(Self, OAuthSession)> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|source| ZoomError::ListenerBindFailed { port, source })?;
        let bound_port = listener
            .local_addr()
            .map_err(|source| ZoomError::ListenerBindFailed { port, source })?
            .port();
        let redirect_uri = OAuthConfig::redirect_uri_for(bound_port);
        debug!(port = bound_port, "callback listener bound");

        let (credential_tx, credential_rx) = oneshot::channel();
        let (error_tx, error_rx) = oneshot::channel();

        let responder = Responder {
            expected_state: state.clone(),
            redirect_uri: redirect_uri.clone(),
            exchanger,
        };
        let handle = tokio::spawn(responder.run(listener, credential_tx, error_tx));

        let session = OAuthSession::new(state, bound_port, redirect_uri, credential_rx, error_rx);
        Ok((
            Self {
                port: bound_port,
                handle: Some(handle),
            },
            session,
        ))
    }

    /// Stops the responder and waits until the port is released.
    pub(crate) async fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            debug!(port = self.port, "callback listener closed");
        }
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Outcome of a request on the callback path.
enum Resolution {
    Credential(Credential),
    Error(ZoomError),
}

struct Responder {
    expected_state: String,
    redirect_uri: String,
    exchanger: Arc<dyn TokenExchanger>,
}

impl Responder {
    async fn run(
        self,
        listener: TcpListener,
        credential_tx: oneshot::Sender<Credential>,
        error_tx: oneshot::Sender<ZoomError>,
    ) {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "failed to accept callback connection");
                    continue;
                }
            };
            debug!(%peer, "callback connection");

            let Some(resolution) = self.handle(stream).await else {
                continue;
            };

            // Receivers may already be gone if the caller gave up.
            match resolution {
                Resolution::Credential(credential) => {
                    let _ = credential_tx.send(credential);
                }
                Resolution::Error(error) => {
                    let _ = error_tx.send(error);
                }
            }
            return;
        }
    }

    /// Serves one connection; `None` means keep waiting.
    async fn handle(&self, stream: TcpStream) -> Option<Resolution> {
        let mut reader = BufReader::new(stream);
        let request_line =
            match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request_head(&mut reader)).await {
                Ok(Ok(line)) => line,
                Ok(Err(e)) => {
                    debug!(error = %e, "dropping unreadable callback request");
                    return None;
                }
                Err(_) => {
                    debug!("callback connection sent no request");
                    return None;
                }
            };
        let mut stream = reader.into_inner();

        let Some((method, target)) = parse_request_line(&request_line) else {
            respond(&mut stream, 400, "Bad Request", "Bad request").await;
            return None;
        };
        let Some((path, params)) = parse_target(target) else {
            respond(&mut stream, 400, "Bad Request", "Bad request").await;
            return None;
        };
        if path != CALLBACK_PATH {
            respond(&mut stream, 404, "Not Found", "Not found").await;
            return None;
        }
        if method != "GET" {
            respond(&mut stream, 405, "Method Not Allowed", "Method not allowed").await;
            return None;
        }

        let resolution = self.resolve(&params).await;
        match &resolution {
            Resolution::Credential(_) => {
                info!("authorization code exchanged");
                respond(&mut stream, 200, "OK", SUCCESS_BODY).await;
            }
            Resolution::Error(ZoomError::TokenExchangeFailed(_)) => {
                respond(&mut stream, 500, "Internal Server Error", "Token exchange failed").await;
            }
            Resolution::Error(e) => {
                respond(&mut stream, 400, "Bad Request", &e.to_string()).await;
            }
        }
        Some(resolution)
    }

    async fn resolve(&self, params: &CallbackParams) -> Resolution {
        if params.state.as_deref() != Some(self.expected_state.as_str()) {
            warn!("OAuth callback state mismatch");
            return Resolution::Error(ZoomError::CallbackStateMismatch);
        }
        if let Some(reason) = &params.error {
            return Resolution::Error(ZoomError::AuthorizationDenied(reason.clone()));
        }
        let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
            return Resolution::Error(ZoomError::CallbackMissingCode);
        };

        match self.exchanger.exchange(code, &self.redirect_uri).await {
            Ok(credential) => Resolution::Credential(credential),
            Err(e) => Resolution::Error(ZoomError::TokenExchangeFailed(Box::new(e))),
        }
    }
}

/// Query parameters of interest on the redirect.
#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackParams {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

/// Reads the request line and discards the headers.
async fn read_request_head(reader: &mut BufReader<TcpStream>) -> std::io::Result<String> {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let mut header = String::new();
    for _ in 0..MAX_HEADER_LINES {
        header.clear();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }
    Ok(request_line)
}

/// Splits `GET /path?query HTTP/1.1` into method and target.
fn parse_request_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    Some((method, target))
}

/// Splits a request target into its path and the callback parameters.
fn parse_target(target: &str) -> Option<(String, CallbackParams)> {
    let url = url::Url::parse("http://localhost").ok()?.join(target).ok()?;

    let mut params = CallbackParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "state" => params.state = Some(value.into_owned()),
            "code" => params.code = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            _ => {}
        }
    }
    Some((url.path().to_string(), params))
}

async fn respond(stream: &mut TcpStream, status: u16, reason: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!(error = %e, "failed to write callback response");
        return;
    }
    let _ = stream.shutdown().await;
}
