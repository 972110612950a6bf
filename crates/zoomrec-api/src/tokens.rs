//! OAuth credential and its on-disk store.
//!
//! The token file is plain JSON shaped like the token endpoint response, so
//! it can be inspected or produced by other tools. Writes go through a
//! temporary sibling and a rename, so a crash never leaves a half-written
//! credential behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::{ZoomError, ZoomResult};

/// Directory under the home directory holding the token file.
const TOKEN_DIR: &str = ".zoom-recordings";

/// Default token file name.
const TOKEN_FILE: &str = "token.json";

/// How long before the stated expiry a token is treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// An OAuth access credential.
///
/// Expiry is advisory: a credential without a refresh token is still used
/// after it expires, and the API decides whether to accept it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token for API requests.
    pub access_token: String,

    /// Token type, normally `bearer`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,

    /// Token used to obtain a new access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token expires, if known.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_expiry"
    )]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// Creates a credential from a token endpoint response.
    ///
    /// A missing or non-positive `expires_in` leaves the expiry unknown.
    pub fn from_expires_in(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        let expiry = expires_in_secs
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            expiry,
        }
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the access token is expired or about to expire at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_LEEWAY_SECS) >= expiry,
            None => false,
        }
    }

    /// Returns true if a refresh should be attempted before the next request.
    pub fn needs_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.is_expired()
    }
}

// Zero timestamps (e.g. "0001-01-01T00:00:00Z") mean "no expiry".
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let expiry = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(expiry.filter(|e| e.timestamp() > 0))
}

/// File-backed credential store.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns `~/.zoom-recordings/token.json`.
    pub fn default_path() -> ZoomResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            ZoomError::Configuration("cannot determine home directory".to_string())
        })?;
        Ok(home.join(TOKEN_DIR).join(TOKEN_FILE))
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored credential.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet. A file that
    /// exists but does not decode is an error.
    pub fn load(&self) -> ZoomResult<Option<Credential>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no token file");
                return Ok(None);
            }
            Err(e) => return Err(ZoomError::io("reading token file", e)),
        };

        let credential: Credential = serde_json::from_str(&content)
            .map_err(|e| ZoomError::decode(format!("token file {}", self.path.display()), e))?;

        debug!(path = %self.path.display(), "loaded token");
        Ok(Some(credential))
    }

    /// Saves a credential, replacing any previous one.
    pub fn save(&self, credential: &Credential) -> ZoomResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)
                .map_err(|e| ZoomError::io("creating token directory", e))?;
        }

        let content = serde_json::to_string_pretty(credential)
            .map_err(|e| ZoomError::Internal(format!("serializing token: {e}")))?;

        let temp_path = tmp_sibling(&self.path);
        let written = write_private_file(&temp_path, content.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(ZoomError::io("writing token file", e));
        }

        debug!(path = %self.path.display(), "saved token");
        Ok(())
    }

    /// Removes the stored credential.
    ///
    /// Returns whether a file was removed.
    pub fn clear(&self) -> ZoomResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "removed token");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ZoomError::io("removing token file", e)),
        }
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

fn write_private_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential::from_expires_in("access", "bearer", Some("refresh".into()), Some(3600))
    }

    #[test]
    fn fresh_credential_is_not_expired() {
        let cred = credential();
        assert!(!cred.is_expired());
        assert!(!cred.needs_refresh());
    }

    #[test]
    fn expiry_leeway_applies() {
        let mut cred = credential();
        let now = Utc::now();
        cred.expiry = Some(now + Duration::seconds(30));
        assert!(cred.is_expired_at(now));
        cred.expiry = Some(now + Duration::seconds(120));
        assert!(!cred.is_expired_at(now));
    }

    #[test]
    fn expired_without_refresh_token_is_used_as_is() {
        let mut cred = Credential::from_expires_in("access", "bearer", None, None);
        cred.expiry = Some(Utc::now() - Duration::hours(1));
        assert!(cred.is_expired());
        assert!(!cred.needs_refresh());
    }

    #[test]
    fn no_expiry_never_expires() {
        let cred = Credential::from_expires_in("access", "bearer", None, Some(0));
        assert!(cred.expiry.is_none());
        assert!(!cred.is_expired());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));

        store.save(&credential()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
        assert!(loaded.expiry.is_some());
        assert!(!tmp_sibling(store.path()).exists());
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        store.save(&credential()).unwrap();
        let mut updated = credential();
        updated.access_token = "second".into();
        store.save(&updated).unwrap();

        assert_eq!(store.load().unwrap().unwrap().access_token, "second");
    }

    #[test]
    fn load_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn load_corrupt_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{not json").unwrap();

        let err = TokenStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ZoomError::Decode { .. }));
    }

    #[test]
    fn loads_token_endpoint_shaped_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(
            &path,
            r#"{
                "access_token": "abc",
                "token_type": "bearer",
                "refresh_token": "def",
                "expiry": "2026-05-01T12:00:00.123456789+02:00",
                "expires_in": 3599
            }"#,
        )
        .unwrap();

        let cred = TokenStore::new(&path).load().unwrap().unwrap();
        assert_eq!(cred.access_token, "abc");
        assert_eq!(cred.refresh_token.as_deref(), Some("def"));
        assert_eq!(
            cred.expiry.unwrap().to_rfc3339(),
            "2026-05-01T10:00:00.123456789+00:00"
        );
    }

    #[test]
    fn zero_expiry_means_none() {
        let json = r#"{"access_token":"abc","expiry":"0001-01-01T00:00:00Z"}"#;
        let cred: Credential = serde_json::from_str(json).unwrap();
        assert!(cred.expiry.is_none());
        assert!(cred.token_type.is_empty());
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        assert!(!store.clear().unwrap());
        store.save(&credential()).unwrap();
        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let token_dir = dir.path().join("private");
        let store = TokenStore::new(token_dir.join("token.json"));
        store.save(&credential()).unwrap();

        let file_mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        let dir_mode = fs::metadata(&token_dir).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }
}
