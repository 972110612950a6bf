//! Text output for the `list` command.

use std::fmt::Write as _;

use zoomrec_api::Meeting;
use zoomrec_core::DateRange;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Renders meetings and their files as an indented listing.
pub fn render_listing(range: &DateRange, meetings: &[Meeting]) -> String {
    if meetings.is_empty() {
        return "No recordings found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Recordings from {}:\n", range);
    for meeting in meetings {
        let _ = writeln!(
            out,
            "  {}  {} ({} min)",
            meeting.start_time.format("%Y-%m-%d %H:%M"),
            meeting.topic,
            meeting.duration
        );
        for file in &meeting.files {
            let _ = writeln!(
                out,
                "    - {} ({}, {:.1} MB)",
                file.recording_type,
                file.file_extension,
                file.file_size as f64 / BYTES_PER_MB
            );
        }
    }
    let _ = writeln!(out, "\nTotal: {} meetings", meetings.len());
    out
}
