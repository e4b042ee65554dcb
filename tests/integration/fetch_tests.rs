//! Fetcher error classification against real sockets
//!
//! These tests use wiremock for the HTTP side and a closed local port for
//! connection failures.

use regex_crawler::config::FetchConfig;
use regex_crawler::crawler::{FetchErrorKind, HttpFetcher, PageFetcher};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(timeout_secs: u64) -> HttpFetcher {
    let config = FetchConfig {
        timeout_secs,
        connect_timeout_secs: timeout_secs,
        user_agent: "TestBot/1.0".to_string(),
    };
    HttpFetcher::new(&config).expect("Failed to build fetcher")
}

/// Returns a URL on a local port nothing is listening on
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

#[tokio::test]
async fn test_fetch_success_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Test Page</body></html>"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = fetcher(5)
        .fetch(&format!("{}/", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert_eq!(body, "<html><body>Test Page</body></html>");
}

#[tokio::test]
async fn test_fetch_non_html_body_is_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("plain 10.1.1.1")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&mock_server)
        .await;

    let body = fetcher(5)
        .fetch(&format!("{}/data.txt", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert_eq!(body, "plain 10.1.1.1");
}

#[tokio::test]
async fn test_fetch_http_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/gone", mock_server.uri());
    let err = fetcher(5).fetch(&url).await.unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::HttpStatus(404));
    assert_eq!(err.url, url);
}

#[tokio::test]
async fn test_fetch_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let err = fetcher(5).fetch(&mock_server.uri()).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::HttpStatus(503));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let started = std::time::Instant::now();
    let err = fetcher(1).fetch(&mock_server.uri()).await.unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    let url = closed_port_url();
    let err = fetcher(2).fetch(&url).await.unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::ConnectionFailed);
    assert_eq!(err.url, url);
}

#[tokio::test]
async fn test_fetch_missing_scheme() {
    let err = fetcher(2).fetch("example.com/page").await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::MissingScheme);
}
