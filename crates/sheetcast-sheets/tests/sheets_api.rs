//! HTTP-level tests for the Sheets adapter against a mock server.

use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheetcast_sheets::SheetsClient;
use sheetcast_types::{BackoffPolicy, RowSource, SheetcastError};

fn client(server: &MockServer) -> SheetsClient {
    SheetsClient::new("test-token".into(), "sheet-1".into(), "Posts".into())
        .with_base_url(server.uri())
        .with_backoff(BackoffPolicy::None)
}

#[tokio::test]
async fn fetch_rows_filters_and_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/sheet-1/values/Posts!A1:DZ"))
        .and(query_param("valueRenderOption", "FORMATTED_VALUE"))
        .and(query_param("dateTimeRenderOption", "FORMATTED_STRING"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "range": "Posts!A1:DZ",
            "values": [
                ["prompt", "image_url"],
                ["desc1", "http://a"],
                ["", "http://b"],
                ["desc3", "http://c"]
            ]
        })))
        .mount(&server)
        .await;

    let rows = client(&server).fetch_rows().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].row_number, 2);
    assert_eq!(rows[1].row_number, 4);
}

#[tokio::test]
async fn fetch_rows_empty_sheet_yields_no_rows() {
    let server = MockServer::start().await;
    // An empty sheet omits "values" entirely.
    Mock::given(method("GET"))
        .and(path("/spreadsheets/sheet-1/values/Posts!A1:DZ"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"range": "Posts!A1:DZ"})),
        )
        .mount(&server)
        .await;

    let rows = client(&server).fetch_rows().await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn fetch_rows_retries_transient_503() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/sheet-1/values/Posts!A1:DZ"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": {"message": "backend unavailable"}
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/sheet-1/values/Posts!A1:DZ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [["p", "u"], ["desc", "http://a"]]
        })))
        .mount(&server)
        .await;

    let rows = client(&server).fetch_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn fetch_rows_fatal_on_403() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/sheet-1/values/Posts!A1:DZ"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"message": "The caller does not have permission"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).fetch_rows().await.unwrap_err();
    match err {
        SheetcastError::Api {
            status, retryable, ..
        } => {
            assert_eq!(status, 403);
            assert!(!retryable);
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_rows_exhausts_on_persistent_429() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/sheet-1/values/Posts!A1:DZ"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "rate limit"}
        })))
        .expect(5)
        .mount(&server)
        .await;

    let err = client(&server).fetch_rows().await.unwrap_err();
    assert!(matches!(
        err,
        SheetcastError::RetriesExhausted { attempts: 5, .. }
    ));
}

#[tokio::test]
async fn clear_row_posts_to_clear_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/sheet-1/values/Posts!A4:DZ4:clear"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "spreadsheetId": "sheet-1",
            "clearedRange": "Posts!A4:DZ4"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).clear_row(4).await.unwrap();
}

#[tokio::test]
async fn clear_row_surfaces_fatal_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/sheet-1/values/Posts!A2:DZ2:clear"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"message": "Unable to parse range"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).clear_row(2).await.unwrap_err();
    assert!(matches!(err, SheetcastError::Api { status: 400, .. }));
}
