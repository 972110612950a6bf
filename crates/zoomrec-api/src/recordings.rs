//! Paginated listing of cloud recordings.

use tokio_util::sync::CancellationToken;
use tracing::debug;
use zoomrec_core::DateRange;

use crate::cancel::cancellable;
use crate::error::{ZoomError, ZoomResult};
use crate::transport::AuthenticatedTransport;
use crate::types::{Meeting, RecordingsPage};

/// Meetings requested per page (the API maximum).
pub const PAGE_SIZE: u32 = 300;

/// Client for `GET /users/me/recordings`.
#[derive(Debug, Clone)]
pub struct RecordingsClient {
    base_url: String,
}

impl RecordingsClient {
    /// Creates a client for the given API base URL, e.g. `https://api.zoom.us/v2`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    /// Lists every meeting with recordings in `range`.
    ///
    /// Pages are followed until the API stops returning a continuation
    /// token. Meetings keep page order, then the order within each page.
    /// Any failed page fails the whole listing.
    pub async fn list_recordings(
        &self,
        transport: &mut AuthenticatedTransport,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> ZoomResult<Vec<Meeting>> {
        let url = format!("{}/users/me/recordings", self.base_url);
        let from = range.from_param();
        let to = range.to_param();
        let page_size = PAGE_SIZE.to_string();

        let mut meetings = Vec::new();
        let mut next_page_token: Option<String> = None;
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            let mut query = vec![
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("page_size", page_size.as_str()),
            ];
            if let Some(token) = next_page_token.as_deref() {
                query.push(("next_page_token", token));
            }

            let page = cancellable(cancel, fetch_page(transport, &url, &query)).await?;
            debug!(
                page = page_number,
                meetings = page.meetings.len(),
                total_records = page.total_records,
                "fetched recordings page"
            );

            next_page_token = page.continuation().map(str::to_string);
            meetings.extend(page.meetings);
            if next_page_token.is_none() {
                break;
            }
        }

        Ok(meetings)
    }
}

async fn fetch_page(
    transport: &mut AuthenticatedTransport,
    url: &str,
    query: &[(&str, &str)],
) -> ZoomResult<RecordingsPage> {
    let response = transport.get(url, query).await?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ZoomError::network("reading recordings response", e))?;

    if status != reqwest::StatusCode::OK {
        return Err(ZoomError::remote_api(status, body));
    }

    serde_json::from_str(&body).map_err(|e| ZoomError::decode("recordings response", e))
}
