//! Wire types for the cloud recordings API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Status of a recording file that is ready to download.
pub const STATUS_COMPLETED: &str = "completed";

/// One page of `GET /users/me/recordings`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingsPage {
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
}

impl RecordingsPage {
    /// Token for the next page, or `None` on the last page.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// A meeting with cloud recordings.
#[derive(Debug, Clone, Deserialize)]
pub struct Meeting {
    pub uuid: String,
    #[serde(default)]
    pub topic: String,
    pub start_time: DateTime<Utc>,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: u32,
    /// Files in the order the API returned them.
    #[serde(default, rename = "recording_files")]
    pub files: Vec<RecordingFile>,
}

/// A single recorded file of a meeting.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingFile {
    #[serde(default)]
    pub id: String,
    /// Upper-case type such as `MP4`, `M4A` or `TRANSCRIPT`.
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_extension: String,
    pub download_url: String,
    #[serde(default)]
    pub status: String,
    /// What was recorded, e.g. `shared_screen_with_speaker_view`.
    #[serde(default)]
    pub recording_type: String,
    /// Size in bytes.
    #[serde(default)]
    pub file_size: u64,
}

impl RecordingFile {
    /// Returns true once the provider has finished processing the file.
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Lower-case extension for the local file name.
    ///
    /// Falls back to the file type when the API omits the extension.
    pub fn extension(&self) -> String {
        if self.file_extension.is_empty() {
            self.file_type.to_lowercase()
        } else {
            self.file_extension.to_lowercase()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "from": "2026-01-01",
        "to": "2026-01-02",
        "page_count": 1,
        "page_size": 300,
        "total_records": 1,
        "next_page_token": "",
        "meetings": [{
            "uuid": "abc==",
            "id": 123456789,
            "topic": "Weekly Sync",
            "start_time": "2026-01-01T10:00:00Z",
            "duration": 45,
            "recording_files": [
                {
                    "id": "f1",
                    "file_type": "MP4",
                    "file_extension": "MP4",
                    "download_url": "https://zoom.us/rec/download/f1",
                    "status": "completed",
                    "recording_type": "shared_screen_with_speaker_view",
                    "file_size": 126353408
                },
                {
                    "id": "f2",
                    "file_type": "TRANSCRIPT",
                    "download_url": "https://zoom.us/rec/download/f2",
                    "status": "processing",
                    "recording_type": "audio_transcript",
                    "file_size": 0
                }
            ]
        }]
    }"#;

    #[test]
    fn decodes_listing_page() {
        let page: RecordingsPage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.total_records, 1);
        assert_eq!(page.continuation(), None);

        let meeting = &page.meetings[0];
        assert_eq!(meeting.topic, "Weekly Sync");
        assert_eq!(meeting.duration, 45);
        assert_eq!(meeting.files.len(), 2);
        assert_eq!(meeting.files[0].id, "f1");
        assert!(meeting.files[0].is_completed());
        assert!(!meeting.files[1].is_completed());
    }

    #[test]
    fn continuation_token_present() {
        let page: RecordingsPage =
            serde_json::from_str(r#"{"next_page_token":"tok","meetings":[]}"#).unwrap();
        assert_eq!(page.continuation(), Some("tok"));
    }

    #[test]
    fn extension_falls_back_to_file_type() {
        let page: RecordingsPage = serde_json::from_str(PAGE).unwrap();
        let files = &page.meetings[0].files;
        assert_eq!(files[0].extension(), "mp4");
        assert_eq!(files[1].extension(), "transcript");
    }
}
