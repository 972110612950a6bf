//! Error types for Zoom operations.
//!
//! Every variant carries the failing operation and, where there is one, the
//! underlying cause as its [`source`](std::error::Error::source).

use std::io;

use thiserror::Error;

/// A specialized Result type for Zoom operations.
pub type ZoomResult<T> = Result<T, ZoomError>;

/// Errors that can occur while authenticating, listing or downloading.
#[derive(Debug, Error)]
pub enum ZoomError {
    /// No stored credential; the user has to log in first.
    #[error("not authenticated, run 'zoom-recordings login' first")]
    NotAuthenticated,

    /// The `state` on the OAuth callback did not match the one we sent.
    #[error("state mismatch in OAuth callback")]
    CallbackStateMismatch,

    /// The OAuth callback carried no authorization code.
    #[error("missing code in OAuth callback")]
    CallbackMissingCode,

    /// The provider redirected back with an `error` parameter.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The authorization code could not be exchanged for a token.
    #[error("exchanging code for token: {0}")]
    TokenExchangeFailed(#[source] Box<ZoomError>),

    /// An expired access token could not be refreshed.
    #[error("refreshing access token: {0}")]
    TokenRefreshFailed(#[source] Box<ZoomError>),

    /// The local callback listener could not bind its port.
    #[error("starting callback server on port {port}: {source}")]
    ListenerBindFailed {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The remote API answered with a non-success status.
    #[error("API returned status {status}: {body}")]
    RemoteApi { status: u16, body: String },

    /// The request never produced a response (DNS, TLS, reset, timeout).
    #[error("{context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// A response body or stored file was not the JSON we expected.
    #[error("decoding {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A local filesystem operation failed.
    #[error("{context}: {source}")]
    LocalIo {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Invalid endpoint or client configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Unexpected internal state.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ZoomError {
    /// Creates a network error.
    pub fn network(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            context: context.into(),
            source,
        }
    }

    /// Creates a decode error.
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    /// Creates a local IO error.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::LocalIo {
            context: context.into(),
            source,
        }
    }

    /// Creates a remote API error from a status code and response body.
    pub fn remote_api(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::RemoteApi {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    /// Returns true if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if the user has to run `login` to recover.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::NotAuthenticated => true,
            Self::RemoteApi { status, .. } => *status == 401,
            Self::TokenRefreshFailed(cause) => !matches!(**cause, Self::Configuration(_)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn not_authenticated_tells_user_what_to_do() {
        let msg = ZoomError::NotAuthenticated.to_string();
        assert!(msg.contains("zoom-recordings login"));
        assert!(ZoomError::NotAuthenticated.requires_login());
    }

    #[test]
    fn remote_api_display_includes_status_and_body() {
        let err = ZoomError::remote_api(reqwest::StatusCode::BAD_REQUEST, "bad from date");
        assert_eq!(err.to_string(), "API returned status 400: bad from date");
        assert!(!err.requires_login());
    }

    #[test]
    fn unauthorized_requires_login() {
        let err = ZoomError::remote_api(reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(err.requires_login());
    }

    #[test]
    fn refresh_failure_requires_login_unless_unconfigured() {
        let rejected = ZoomError::TokenRefreshFailed(Box::new(ZoomError::remote_api(
            reqwest::StatusCode::BAD_REQUEST,
            "invalid_grant",
        )));
        assert!(rejected.requires_login());

        let unconfigured = ZoomError::TokenRefreshFailed(Box::new(ZoomError::Configuration(
            "missing client secret".into(),
        )));
        assert!(!unconfigured.requires_login());
    }

    #[test]
    fn wrapped_exchange_error_keeps_source() {
        let inner = ZoomError::remote_api(reqwest::StatusCode::BAD_REQUEST, "invalid_grant");
        let err = ZoomError::TokenExchangeFailed(Box::new(inner));
        assert!(err.to_string().contains("invalid_grant"));
        assert!(err.source().is_some());
    }

    #[test]
    fn io_error_has_context() {
        let err = ZoomError::io("creating temp file", io::Error::other("disk full"));
        assert_eq!(err.to_string(), "creating temp file: disk full");
        assert!(err.source().is_some());
    }

    #[test]
    fn cancelled_is_detected() {
        assert!(ZoomError::Cancelled.is_cancelled());
        assert!(!ZoomError::CallbackMissingCode.is_cancelled());
    }
}
