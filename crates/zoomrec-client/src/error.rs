//! Client error types.

use std::fmt;

use zoomrec_api::ZoomError;
use zoomrec_core::DateRangeError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Error talking to Zoom or handling its tokens.
    Zoom(ZoomError),
    /// Invalid `--from`/`--to`.
    DateRange(DateRangeError),
    /// IO error.
    Io(std::io::Error),
    /// Gave up waiting for something.
    Timeout(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Zoom(err) => write!(f, "{}", err),
            Self::DateRange(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Zoom(err) => Some(err),
            Self::DateRange(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Config(_) | Self::Timeout(_) => None,
        }
    }
}

impl From<ZoomError> for ClientError {
    fn from(err: ZoomError) -> Self {
        Self::Zoom(err)
    }
}

impl From<DateRangeError> for ClientError {
    fn from(err: DateRangeError) -> Self {
        Self::DateRange(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
