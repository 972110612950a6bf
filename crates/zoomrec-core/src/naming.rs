//! Filesystem-safe naming for downloaded recordings.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Fallback segment when a topic sanitizes to nothing.
pub const UNTITLED: &str = "untitled";

static DISALLOWED_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9-]+").expect("valid regex"));

/// Turns a meeting topic into a lower-case filename segment.
///
/// Runs made only of spaces become a single hyphen. Any other run of
/// characters outside `[a-zA-Z0-9-]` is dropped, together with the spaces
/// inside it. An empty result becomes [`UNTITLED`].
///
/// ```
/// use zoomrec_core::sanitize_topic;
///
/// assert_eq!(sanitize_topic("Weekly Sync: Q3 Review!"), "weekly-syncq3-review");
/// assert_eq!(sanitize_topic("???"), "untitled");
/// ```
pub fn sanitize_topic(topic: &str) -> String {
    let sanitized = DISALLOWED_RUN.replace_all(topic, |caps: &Captures<'_>| {
        if caps[0].chars().all(|c| c == ' ') {
            "-"
        } else {
            ""
        }
    });

    let sanitized = sanitized.to_lowercase();
    if sanitized.is_empty() {
        UNTITLED.to_string()
    } else {
        sanitized
    }
}
