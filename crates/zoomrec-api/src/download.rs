//! Streamed, atomic download of a single recording file.
//!
//! The body is written to `<dest>.tmp` and renamed over `dest` only after
//! the whole body is on disk. The temporary file is removed on every
//! failure path, so `dest` either holds a complete file or is untouched.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures_util::{Stream, StreamExt, TryStreamExt};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cancel::cancellable;
use crate::error::{ZoomError, ZoomResult};

/// Downloads `download_url` to `destination`, returning the bytes written.
///
/// The access token goes in the `access_token` query parameter; download
/// URLs do not accept an `Authorization` header.
pub async fn download_file(
    client: &reqwest::Client,
    download_url: &str,
    access_token: &str,
    destination: &Path,
    cancel: &CancellationToken,
) -> ZoomResult<u64> {
    let mut url = url::Url::parse(download_url)
        .map_err(|e| ZoomError::Configuration(format!("download URL '{download_url}': {e}")))?;
    url.query_pairs_mut().append_pair("access_token", access_token);

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ZoomError::io(format!("creating {}", parent.display()), e))?;
    }

    let mut partial = PartialFile::create(destination).await?;

    // Never log `url` or leave it in an error: it carries the token.
    debug!(url = download_url, dest = %destination.display(), "downloading");
    let response = cancellable(cancel, async {
        client
            .get(url)
            .send()
            .await
            .map_err(|e| ZoomError::network("download request failed", e.without_url()))
    })
    .await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(ZoomError::remote_api(status, body));
    }

    let body = response
        .bytes_stream()
        .map_err(|e| ZoomError::network("reading download body", e.without_url()));
    let written = partial.fill_from(body, cancel).await?;
    partial.persist().await?;

    debug!(bytes = written, dest = %destination.display(), "download complete");
    Ok(written)
}

/// Temporary sibling of a download destination.
///
/// Removed on drop unless [`persist`](Self::persist) succeeded.
struct PartialFile {
    file: Option<File>,
    temp_path: PathBuf,
    destination: PathBuf,
    persisted: bool,
}

impl PartialFile {
    async fn create(destination: &Path) -> ZoomResult<Self> {
        let temp_path = temp_path_for(destination);
        let file = File::create(&temp_path)
            .await
            .map_err(|e| ZoomError::io(format!("creating {}", temp_path.display()), e))?;

        Ok(Self {
            file: Some(file),
            temp_path,
            destination: destination.to_path_buf(),
            persisted: false,
        })
    }

    /// Appends every chunk of `stream`, stopping at the first error.
    async fn fill_from<S, B>(&mut self, stream: S, cancel: &CancellationToken) -> ZoomResult<u64>
    where
        S: Stream<Item = ZoomResult<B>>,
        B: AsRef<[u8]>,
    {
        let file = self.open_file()?;
        let mut stream = std::pin::pin!(stream);
        let mut written = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ZoomError::Cancelled),
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;
            let bytes = chunk.as_ref();
            file.write_all(bytes)
                .await
                .map_err(|e| ZoomError::io("writing download", e))?;
            written += bytes.len() as u64;
        }

        Ok(written)
    }

    /// Flushes the file to disk and renames it over the destination.
    async fn persist(mut self) -> ZoomResult<()> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| ZoomError::Internal("download file already closed".to_string()))?;
        file.flush()
            .await
            .map_err(|e| ZoomError::io("flushing download", e))?;
        file.sync_all()
            .await
            .map_err(|e| ZoomError::io("syncing download", e))?;
        drop(file);

        fs::rename(&self.temp_path, &self.destination)
            .await
            .map_err(|e| ZoomError::io(format!("renaming to {}", self.destination.display()), e))?;
        self.persisted = true;
        Ok(())
    }

    fn open_file(&mut self) -> ZoomResult<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| ZoomError::Internal("download file already closed".to_string()))
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Close before removing.
        drop(self.file.take());
        if !self.persisted {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                debug!(
                    path = %self.temp_path.display(),
                    error = %e,
                    "failed to remove partial download"
                );
            }
        }
    }
}

fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
