//! Integration tests for the search engine
//!
//! These tests use wiremock to create mock HTTP servers and run full
//! searches end-to-end through the HTTP fetcher and a background worker.

use regex_crawler::config::FetchConfig;
use regex_crawler::crawler::{CrawlRequest, FetchErrorKind, HttpFetcher, SearchEngine};
use regex_crawler::patterns::PatternRegistry;
use regex_crawler::results::{InvalidRequest, MatchRecord, SearchEvent};
use regex_crawler::session::{SearchHandle, Searcher};
use regex_crawler::state::SearchState;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates an engine backed by a real HTTP fetcher with a short timeout
fn create_engine() -> SearchEngine {
    let config = FetchConfig {
        timeout_secs: 2,
        connect_timeout_secs: 2,
        user_agent: "TestBot/1.0".to_string(),
    };
    let fetcher = HttpFetcher::new(&config).expect("Failed to build fetcher");
    let registry = PatternRegistry::builtin().expect("Built-in patterns must compile");
    SearchEngine::new(Arc::new(fetcher), Arc::new(registry))
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn run_to_end(request: CrawlRequest) -> (SearchState, Vec<SearchEvent>) {
    let mut handle = SearchHandle::spawn(create_engine(), request);
    let outcome = handle.join().await.expect("Search worker should not fail");
    (outcome.state, handle.drain())
}

fn match_records(events: &[SearchEvent]) -> Vec<MatchRecord> {
    events.iter().filter_map(|e| e.as_match().cloned()).collect()
}

#[tokio::test]
async fn test_single_page_search() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Test 123 Test 456"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (state, events) =
        run_to_end(CrawlRequest::new(base_url.clone()).with_pattern(r"Test \d+")).await;

    assert_eq!(state, SearchState::Completed);
    let matches = match_records(&events);
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].matched_text, "Test 123");
    assert_eq!(matches[1].matched_text, "Test 456");
    assert!(matches.iter().all(|m| m.source_url == base_url));
    assert!(matches.iter().all(|m| m.pattern == r"Test \d+"));
}

#[tokio::test]
async fn test_recursive_search_follows_same_origin_links_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><body>
            <a href="/page2">Page 2</a>
            <a href="/page1">Page 1</a>
            <a href="{}/page1#again">Page 1 again</a>
            <a href="https://external.example.org/page">External</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("mail alice@example.com"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("mail bob@example.com, host 192.168.0.1"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(base_url.clone())
        .with_builtin("email")
        .with_builtin("ip")
        .recursive(true);
    let (state, events) = run_to_end(request).await;

    assert_eq!(state, SearchState::Completed);
    let found: Vec<(String, String)> = match_records(&events)
        .into_iter()
        .map(|m| (m.source_url, m.matched_text))
        .collect();
    assert_eq!(
        found,
        vec![
            (format!("{}/page1", base_url), "alice@example.com".to_string()),
            (format!("{}/page2", base_url), "bob@example.com".to_string()),
            (format!("{}/page2", base_url), "192.168.0.1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_padded_base_url_is_trimmed_everywhere() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/page1">Page 1</a>"#.to_string()).await;
    mount_page(&mock_server, "/page1", "order ORD-9".to_string()).await;

    let request = CrawlRequest::new(format!("  {}\t", base_url))
        .with_pattern(r"ORD-\d+")
        .recursive(true);
    let (state, events) = run_to_end(request).await;

    assert_eq!(state, SearchState::Completed);
    let matches = match_records(&events);
    assert_eq!(events.len(), 1);
    assert_eq!(matches[0].source_url, format!("{}/page1", base_url));
    assert_eq!(matches[0].matched_text, "ORD-9");
}

#[tokio::test]
async fn test_failed_page_does_not_stop_search() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/broken">Broken</a><a href="/ok">Ok</a>"#.to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/ok", "ticket TICKET-77".to_string()).await;

    let request = CrawlRequest::new(base_url.clone())
        .with_pattern(r"TICKET-\d+")
        .recursive(true);
    let (state, events) = run_to_end(request).await;

    assert_eq!(state, SearchState::Completed);
    assert_eq!(events.len(), 2);
    match &events[0] {
        SearchEvent::FetchFailed(err) => {
            assert_eq!(err.kind, FetchErrorKind::HttpStatus(500));
            assert_eq!(err.url, format!("{}/broken", base_url));
        }
        other => panic!("Expected fetch failure, got {:?}", other),
    }
    assert_eq!(events[1].as_match().unwrap().matched_text, "TICKET-77");
}

#[tokio::test]
async fn test_recursive_base_page_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(mock_server.uri())
        .with_pattern("anything")
        .recursive(true);
    let (state, events) = run_to_end(request).await;

    assert_eq!(state, SearchState::Completed);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        SearchEvent::FetchFailed(err) if err.kind == FetchErrorKind::HttpStatus(404)
    ));
}

#[tokio::test]
async fn test_empty_pattern_set_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (state, events) = run_to_end(CrawlRequest::new(mock_server.uri()).recursive(true)).await;

    assert_eq!(state, SearchState::Completed);
    assert_eq!(
        events,
        vec![SearchEvent::InvalidRequest(InvalidRequest::NoPattern)]
    );
}

#[tokio::test]
async fn test_pre_cancelled_search_is_silent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Test 1"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = regex_crawler::CancellationToken::new();
    token.cancel();

    let mut handle = SearchHandle::spawn_with_token(
        create_engine(),
        CrawlRequest::new(mock_server.uri()).with_pattern(r"Test \d+"),
        token,
    );
    let outcome = handle.join().await.expect("Search worker should not fail");

    assert_eq!(outcome.state, SearchState::Cancelled);
    assert!(handle.try_pop().is_none());
}

#[tokio::test]
async fn test_stop_mid_crawl_preserves_earlier_matches() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a-fast">A</a><a href="/b-slow">B</a><a href="/c-never">C</a>"#.to_string(),
    )
    .await;

    mount_page(&mock_server, "/a-fast", "found FIRST".to_string()).await;

    Mock::given(method("GET"))
        .and(path("/b-slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("found SECOND")
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c-never"))
        .respond_with(ResponseTemplate::new(200).set_body_string("found THIRD"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut searcher = Searcher::new(create_engine());
    searcher
        .start(
            CrawlRequest::new(base_url.clone())
                .with_pattern(r"found \w+")
                .recursive(true),
        )
        .await;

    // Poll like a UI loop until the first match shows up, then stop
    let mut events = Vec::new();
    while match_records(&events).is_empty() {
        events.extend(searcher.drain());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    searcher.stop();

    let outcome = searcher
        .wait()
        .await
        .expect("Search should be active")
        .expect("Search worker should not fail");
    events.extend(searcher.drain());

    assert_eq!(outcome.state, SearchState::Cancelled);
    let texts: Vec<String> = match_records(&events)
        .into_iter()
        .map(|m| m.matched_text)
        .collect();
    assert_eq!(texts, vec!["found FIRST"]);
}

#[tokio::test]
async fn test_missing_scheme_is_rejected() {
    let (state, events) =
        run_to_end(CrawlRequest::new("example.com").with_builtin("email")).await;

    assert_eq!(state, SearchState::Completed);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        SearchEvent::InvalidRequest(InvalidRequest::MissingScheme { url }) if url == "example.com"
    ));
}

#[tokio::test]
async fn test_worker_liveness_signals_end_of_stream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("v1 v2")
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&mock_server)
        .await;

    let mut handle = SearchHandle::spawn(
        create_engine(),
        CrawlRequest::new(mock_server.uri()).with_pattern(r"v\d"),
    );

    let mut events = Vec::new();
    loop {
        events.extend(handle.drain());
        if !handle.is_active() {
            events.extend(handle.drain());
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(match_records(&events).len(), 2);
    assert_eq!(handle.state(), SearchState::Completed);
    assert_eq!(handle.join().await.unwrap().state, SearchState::Completed);
}
