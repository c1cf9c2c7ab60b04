use std::sync::Arc;

use httpmock::Method::POST;
use httpmock::MockServer;

use eventq::{
    event::Event,
    upload::{
        encode_batch,
        http::{HttpUploader, HttpUploaderConfig},
        resolver::{DebugUrlResolver, FixedUrl, UrlResolver},
        TransportError, Uploader,
    },
};

const FORM_BODY: &str = "data=%7B%22events%22%3A%5B%7B%22type%22%3A%22A%22%2C%22data%22%3A%221%22%7D%2C%7B%22type%22%3A%22B%22%2C%22data%22%3A%222%22%7D%5D%7D";

fn batch() -> Vec<Event> {
    vec![Event::new("A", "1"), Event::new("B", "2")]
}

fn uploader_for(url: String) -> HttpUploader {
    HttpUploader::new(HttpUploaderConfig {
        server_url: url,
        timeout_ms: Some(5_000),
    })
    .expect("uploader should build")
}

#[test]
fn batch_document_wraps_events() {
    let json = encode_batch(&batch()).expect("encode");
    assert_eq!(
        json,
        r#"{"events":[{"type":"A","data":"1"},{"type":"B","data":"2"}]}"#
    );
    assert_eq!(encode_batch(&[]).expect("encode"), r#"{"events":[]}"#);
}

#[tokio::test]
async fn posts_single_form_field_and_accepts_2xx() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collect")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(FORM_BODY);
            then.status(200);
        })
        .await;

    let uploader = uploader_for(server.url("/collect"));
    uploader.send(&batch()).await.expect("send should succeed");

    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_is_a_transport_error() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/collect");
            then.status(503).body("service unavailable");
        })
        .await;

    let uploader = uploader_for(server.url("/collect"));
    let err = uploader.send(&batch()).await.expect_err("503 must fail");

    match err {
        TransportError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "service unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn unreachable_collector_is_an_http_error() {
    let uploader = uploader_for("http://127.0.0.1:9/collect".to_string());
    let err = uploader.send(&batch()).await.expect_err("nothing listens there");
    assert!(matches!(err, TransportError::Http(_)));
}

#[test]
fn empty_collector_url_is_rejected() {
    let err = HttpUploader::new(HttpUploaderConfig {
        server_url: "   ".to_string(),
        timeout_ms: None,
    })
    .err()
    .expect("empty url must fail");
    assert!(matches!(err, TransportError::Client(_)));
}

#[tokio::test]
async fn debug_resolver_reroutes_to_status_echo() {
    let server = MockServer::start_async().await;
    let collector = server
        .mock_async(|when, then| {
            when.method(POST).path("/collect");
            then.status(200);
        })
        .await;
    let failing = server
        .mock_async(|when, then| {
            when.method(POST).path("/503");
            then.status(503);
        })
        .await;

    let resolver = Arc::new(DebugUrlResolver::with_debug_base(
        server.url("/collect"),
        server.base_url(),
    ));
    let uploader = HttpUploader::with_resolver(resolver.clone(), None).expect("uploader");

    uploader.send(&batch()).await.expect("debug off hits collector");

    resolver.set_debug_mode(true);
    resolver.set_failed_request(true);
    let err = uploader.send(&batch()).await.expect_err("echo answers 503");
    assert!(matches!(err, TransportError::Status { status: 503, .. }));

    collector.assert_hits_async(1).await;
    failing.assert_hits_async(1).await;
}

#[test]
fn debug_resolver_builds_echo_urls() {
    let resolver = DebugUrlResolver::new("https://collector.example.com/events");
    assert_eq!(resolver.resolve(), "https://collector.example.com/events");

    resolver.set_debug_mode(true);
    assert_eq!(resolver.resolve(), "https://httpstat.us/200");

    resolver.set_long_request(true);
    assert_eq!(resolver.resolve(), "https://httpstat.us/200?sleep=3000");

    resolver.set_failed_request(true);
    assert_eq!(resolver.resolve(), "https://httpstat.us/503?sleep=3000");

    resolver.set_debug_mode(false);
    assert_eq!(resolver.resolve(), "https://collector.example.com/events");
}

#[test]
fn fixed_url_always_resolves_the_same() {
    let fixed = FixedUrl("http://localhost/collect".to_string());
    assert_eq!(fixed.resolve(), fixed.resolve());
}
