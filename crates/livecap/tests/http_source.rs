mod common;

use common::{file_len, list_dir, Recorder};
use livecap::{
    presets, CaptureError, CaptureSession, Headers, HttpSettings, HttpSource, StreamSource,
};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_open_forwards_headers_and_streams_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/room.flv"))
        .and(header("referer", "https://live.bilibili.com/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpSource::from_settings(&HttpSettings::default()).unwrap();
    let response = source
        .open(&format!("{}/live/room.flv", server.uri()), &presets::bilibili())
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.status, 200);

    let mut body = response.body;
    let mut data = Vec::new();
    body.read_to_end(&mut data).await.unwrap();
    assert_eq!(data, vec![7u8; 4096]);
}

#[tokio::test]
async fn test_open_reports_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = HttpSource::new(reqwest::Client::new());
    let response = source
        .open(&format!("{}/live/down.flv", server.uri()), &Headers::new())
        .await
        .unwrap();

    assert!(!response.is_success());
    assert_eq!(response.status, 503);
    assert_eq!(response.reason, "Service Unavailable");
}

#[tokio::test]
async fn test_capture_over_http_rotates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/show.ts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 10_000]))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let source = HttpSource::new(reqwest::Client::new());
    let mut session = CaptureSession::new(
        source,
        format!("{}/live/show.ts", server.uri()),
        temp_dir.path().join("show.ts"),
        4_000,
    )
    .unwrap()
    .with_chunk_size(1_000);
    let mut recorder = Recorder::default();

    let summary = session
        .capture(&Headers::new(), &mut recorder, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.total_bytes, 10_000);
    assert!(summary.segments.len() >= 2);
    assert_eq!(recorder.seen.len(), summary.segments.len());

    let names = list_dir(temp_dir.path());
    assert_eq!(names.first().map(String::as_str), Some("show_01.ts"));
    let on_disk: u64 = session.segment_paths().iter().map(|p| file_len(p)).sum();
    assert_eq!(on_disk, 10_000);
}

#[tokio::test]
async fn test_capture_over_http_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut session = CaptureSession::new(
        HttpSource::new(reqwest::Client::new()),
        format!("{}/live/missing.flv", server.uri()),
        temp_dir.path().join("missing.flv"),
        0,
    )
    .unwrap();
    let mut recorder = Recorder::default();

    let err = session
        .capture(&Headers::new(), &mut recorder, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::Status { status: 404, .. }));
    assert!(list_dir(temp_dir.path()).is_empty());
    assert!(recorder.seen.is_empty());
}

#[tokio::test]
async fn test_invalid_url_is_connect_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = CaptureSession::new(
        HttpSource::new(reqwest::Client::new()),
        "not a url",
        temp_dir.path().join("x.flv"),
        0,
    )
    .unwrap();

    let err = session
        .capture(&Headers::new(), &mut Recorder::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::Connect { .. }));
}
