//! `download`: fetch every completed recording file in a date range.
//!
//! Files are fetched one after another. A file already on disk with exactly
//! the declared size is skipped, which makes reruns cheap. A failed file is
//! logged and counted; the batch carries on with the next one. Cancellation
//! and a failed token refresh stop the whole run.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use zoomrec_api::{download_file, Meeting, RecordingFile, ZoomError, ZoomResult};
use zoomrec_core::{sanitize_topic, DateRange};

use super::Session;
use crate::cli::DateArgs;
use crate::config::Settings;
use crate::error::ClientResult;

/// Per-run download counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Files fetched in this run.
    pub downloaded: usize,
    /// Files already present with the expected size.
    pub skipped: usize,
    /// Files whose download failed.
    pub failed: usize,
}

/// Downloads recordings and prints a summary.
pub async fn run(
    settings: &Settings,
    dates: &DateArgs,
    output_dir: Option<PathBuf>,
    cancel: &CancellationToken,
) -> ClientResult<()> {
    let range = dates.resolve()?;
    let output_dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());

    let report = download_recordings(settings, &range, &output_dir, cancel).await?;
    println!(
        "Downloaded {}, skipped {}, failed {} (output: {})",
        report.downloaded,
        report.skipped,
        report.failed,
        output_dir.display()
    );
    Ok(())
}

/// Lists recordings in `range` and downloads them into `output_dir`, then
/// saves the possibly refreshed credential.
pub async fn download_recordings(
    settings: &Settings,
    range: &DateRange,
    output_dir: &Path,
    cancel: &CancellationToken,
) -> ClientResult<DownloadReport> {
    let mut session = Session::open(settings)?;
    let result = download_into(&mut session, range, output_dir, cancel).await;
    session.persist_credential();
    result
}

/// Local file name: `{date}_{topic}_{recording type}.{extension}`, lower-cased.
pub fn destination_filename(meeting: &Meeting, file: &RecordingFile) -> String {
    format!(
        "{}_{}_{}.{}",
        meeting.start_time.format("%Y-%m-%d"),
        sanitize_topic(&meeting.topic),
        file.recording_type,
        file.extension()
    )
    .to_lowercase()
}

async fn download_into(
    session: &mut Session,
    range: &DateRange,
    output_dir: &Path,
    cancel: &CancellationToken,
) -> ClientResult<DownloadReport> {
    let meetings = session.list(range, cancel).await?;
    let mut report = DownloadReport::default();
    if meetings.is_empty() {
        info!("no recordings found");
        return Ok(report);
    }

    tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
        ZoomError::io(
            format!("creating output directory {}", output_dir.display()),
            e,
        )
    })?;

    for meeting in &meetings {
        for file in &meeting.files {
            if !file.is_completed() {
                debug!(file = %file.id, status = %file.status, "skipping incomplete recording");
                continue;
            }

            let filename = destination_filename(meeting, file);
            let destination = output_dir.join(&filename);
            if already_downloaded(&destination, file.file_size).await {
                debug!(file = %filename, "skipping existing file");
                report.skipped += 1;
                continue;
            }

            info!(file = %filename, size_mb = file.file_size / (1024 * 1024), "downloading");
            match fetch(session, file, &destination, cancel).await {
                Ok(_) => report.downloaded += 1,
                // Neither would go better for the next file.
                Err(e @ (ZoomError::Cancelled | ZoomError::TokenRefreshFailed(_))) => {
                    return Err(e.into());
                }
                Err(e) => {
                    error!(file = %filename, error = %e, "failed to download");
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed,
        output_dir = %output_dir.display(),
        "download complete"
    );
    Ok(report)
}

async fn already_downloaded(destination: &Path, expected_size: u64) -> bool {
    match tokio::fs::metadata(destination).await {
        Ok(meta) => meta.is_file() && meta.len() == expected_size,
        Err(_) => false,
    }
}

async fn fetch(
    session: &mut Session,
    file: &RecordingFile,
    destination: &Path,
    cancel: &CancellationToken,
) -> ZoomResult<u64> {
    let transport = session.transport();
    let access_token = transport.access_token().await?;
    download_file(
        transport.http(),
        &file.download_url,
        &access_token,
        destination,
        cancel,
    )
    .await
}
