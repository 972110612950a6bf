//! Zoom cloud recordings: OAuth, token storage, listing and downloads.
//!
//! This crate contains everything that talks to Zoom:
//!
//! - [`Authenticator`] - Local-redirect OAuth authorization-code flow
//! - [`TokenStore`] / [`Credential`] - Persisted OAuth tokens
//! - [`AuthenticatedTransport`] - HTTP client that keeps the credential fresh
//! - [`RecordingsClient`] - Paginated listing of cloud recordings
//! - [`download_file`] - Streamed, atomic download of one recording file
//!
//! # Data flow
//!
//! ```text
//! TokenStore ──load──▶ AuthenticatedTransport ──▶ RecordingsClient
//!     ▲                        │                        │ Vec<Meeting>
//!     │                        │ access token           ▼
//!     └────save (refreshed)────┴──────────────▶ download_file ──▶ disk
//! ```

mod auth;
mod callback;
pub mod cancel;
pub mod config;
pub mod download;
pub mod error;
mod oauth;
mod recordings;
mod tokens;
mod transport;
pub mod types;

pub use auth::{
    authorization_url, generate_state, Authenticator, OAuthSession, SystemBrowser, UrlLauncher,
};
pub use config::{OAuthConfig, OAuthCredentials};
pub use download::download_file;
pub use error::{ZoomError, ZoomResult};
pub use oauth::{BoxFuture, OAuthClient, TokenExchanger};
pub use recordings::{RecordingsClient, PAGE_SIZE};
pub use tokens::{Credential, TokenStore};
pub use transport::AuthenticatedTransport;
pub use types::{Meeting, RecordingFile, RecordingsPage};
