//! `list`: print the recordings in a date range.

use tokio_util::sync::CancellationToken;
use zoomrec_api::Meeting;
use zoomrec_core::DateRange;

use super::Session;
use crate::cli::DateArgs;
use crate::config::Settings;
use crate::error::ClientResult;
use crate::render::render_listing;

/// Lists recordings and prints them.
pub async fn run(
    settings: &Settings,
    dates: &DateArgs,
    cancel: &CancellationToken,
) -> ClientResult<()> {
    let range = dates.resolve()?;
    let meetings = fetch_meetings(settings, &range, cancel).await?;
    print!("{}", render_listing(&range, &meetings));
    Ok(())
}

/// Fetches every meeting in `range`, then saves the possibly refreshed
/// credential.
pub async fn fetch_meetings(
    settings: &Settings,
    range: &DateRange,
    cancel: &CancellationToken,
) -> ClientResult<Vec<Meeting>> {
    let mut session = Session::open(settings)?;
    let result = session.list(range, cancel).await;
    session.persist_credential();
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ClientError;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zoomrec_api::ZoomError;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        )
        .unwrap()
    }

    fn one_meeting() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "total_records": 1,
            "next_page_token": "",
            "meetings": [{
                "uuid": "m1",
                "topic": "Weekly Sync",
                "start_time": "2026-01-01T10:00:00Z",
                "duration": 45,
                "recording_files": []
            }]
        }))
    }

    #[tokio::test]
    async fn requires_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let settings = testing::settings("http://127.0.0.1:1", dir.path());

        let err = fetch_meetings(&settings, &range(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Zoom(ZoomError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn lists_with_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/users/me/recordings"))
            .and(header("authorization", "Bearer stored-token"))
            .respond_with(one_meeting())
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = testing::settings(&server.uri(), dir.path());
        settings
            .token_store()
            .save(&testing::fresh_credential())
            .unwrap();

        let meetings = fetch_meetings(&settings, &range(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].topic, "Weekly Sync");
    }

    #[tokio::test]
    async fn refreshed_token_is_saved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "refreshed-token",
                "token_type": "bearer",
                "refresh_token": "rt-2",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/users/me/recordings"))
            .and(header("authorization", "Bearer refreshed-token"))
            .respond_with(one_meeting())
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = testing::settings(&server.uri(), dir.path());
        let store = settings.token_store();
        store.save(&testing::expired_credential()).unwrap();

        fetch_meetings(&settings, &range(), &CancellationToken::new())
            .await
            .unwrap();

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.access_token, "refreshed-token");
        assert_eq!(saved.refresh_token.as_deref(), Some("rt-2"));
    }

    #[tokio::test]
    async fn api_error_fails_the_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid access token."))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = testing::settings(&server.uri(), dir.path());
        settings
            .token_store()
            .save(&testing::fresh_credential())
            .unwrap();

        let err = fetch_meetings(&settings, &range(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ClientError::Zoom(e) => assert!(e.requires_login()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn token_save_failure_is_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/users/me/recordings"))
            .respond_with(one_meeting())
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = testing::settings(&server.uri(), dir.path());
        settings
            .token_store()
            .save(&testing::fresh_credential())
            .unwrap();
        std::fs::create_dir(dir.path().join("token.json.tmp")).unwrap();

        let meetings = fetch_meetings(&settings, &range(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(meetings.len(), 1);
    }

    #[tokio::test]
    async fn valid_token_works_without_client_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/users/me/recordings"))
            .and(header("authorization", "Bearer stored-token"))
            .respond_with(one_meeting())
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut settings = testing::settings(&server.uri(), dir.path());
        settings.credentials = None;
        settings
            .token_store()
            .save(&testing::fresh_credential())
            .unwrap();

        let meetings = fetch_meetings(&settings, &range(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(meetings.len(), 1);
    }

    #[tokio::test]
    async fn missing_token_is_reported_before_missing_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = testing::settings("http://127.0.0.1:1", dir.path());
        settings.credentials = None;

        let err = fetch_meetings(&settings, &range(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Zoom(ZoomError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn expired_token_without_client_credentials_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut settings = testing::settings(&server.uri(), dir.path());
        settings.credentials = None;
        settings
            .token_store()
            .save(&testing::expired_credential())
            .unwrap();

        let err = fetch_meetings(&settings, &range(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Zoom(ZoomError::TokenRefreshFailed(_))));
    }
}
