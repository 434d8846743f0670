//! Fetcher behavior against a mock TMDb server

use crate::common::{create_test_config, full_page_json, page_json, TEST_KEY};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tmdb_scraper::scraper::build_fetcher;
use tmdb_scraper::{FetchError, FetchTarget};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Fails the first `failures` requests with 500 and notes when each one arrived
struct FlakyResponder {
    failures: usize,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut arrivals = self.arrivals.lock().unwrap();
        arrivals.push(Instant::now());
        if arrivals.len() <= self.failures {
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200).set_body_json(full_page_json(1, 3))
        }
    }
}

#[tokio::test]
async fn test_fetch_sends_discover_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "2"))
        .and(query_param("sort_by", "popularity.desc"))
        .and(query_param("language", "en-US"))
        .and(query_param("include_adult", "false"))
        .and(query_param("api_key", TEST_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page_json(2, 5)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 20, 1);
    let fetcher = build_fetcher(&config).unwrap();

    let page = fetcher.fetch(2).await.unwrap();
    assert_eq!(page.page_number, 2);
    assert_eq!(page.entries.len(), 20);
    assert_eq!(page.entries[0].id, 21);
    assert_eq!(page.total_pages, Some(5));
    assert!(page.has_more);
}

#[tokio::test]
async fn test_bearer_token_goes_in_header() {
    let mock_server = MockServer::start().await;
    let token = "eyJhbGciOiJIUzI1NiJ9.test.signature";

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 1, 1..=3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, 3, 1);
    config.api.api_key = Some(token.to_string());
    let fetcher = build_fetcher(&config).unwrap();

    let page = fetcher.fetch(1).await.unwrap();
    assert_eq!(page.entries.len(), 3);
    assert!(!page.has_more);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0]
        .url
        .query_pairs()
        .all(|(key, _)| key != "api_key"));
}

#[tokio::test]
async fn test_include_adult_parameter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("include_adult", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 1, [7])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, 1, 1);
    config.scraper.include_adult = Some(true);
    let fetcher = build_fetcher(&config).unwrap();

    assert_eq!(fetcher.fetch(1).await.unwrap().entries.len(), 1);
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let mock_server = MockServer::start().await;

    // The first two requests fail, the third succeeds
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page_json(1, 3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 20, 1);
    let fetcher = build_fetcher(&config).unwrap();

    let page = fetcher.fetch(1).await.unwrap();
    assert_eq!(page.entries.len(), 20);
    assert_eq!(fetcher.requests_sent(), 3);
}

#[tokio::test]
async fn test_backoff_gaps_grow_between_attempts() {
    let mock_server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(FlakyResponder {
            failures: 2,
            arrivals: Arc::clone(&arrivals),
        })
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, 20, 1);
    config.api.base_delay_ms = 100;
    config.api.max_delay_ms = 1_000;
    let fetcher = build_fetcher(&config).unwrap();

    fetcher.fetch(1).await.unwrap();

    let arrivals = arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 3);
    let first_gap = arrivals[1] - arrivals[0];
    let second_gap = arrivals[2] - arrivals[1];
    assert!(first_gap >= Duration::from_millis(100));
    assert!(second_gap >= Duration::from_millis(200));
    assert!(second_gap > first_gap);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 20, 1);
    let fetcher = build_fetcher(&config).unwrap();

    match fetcher.fetch(1).await {
        Err(FetchError::RetriesExhausted {
            target,
            attempts,
            last_error,
        }) => {
            assert_eq!(target, FetchTarget::Page(1));
            assert_eq!(attempts, 3);
            assert!(last_error.contains("503"));
        }
        other => panic!("Expected RetriesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 1, 1..=2)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 2, 1);
    let fetcher = build_fetcher(&config).unwrap();

    assert_eq!(fetcher.fetch(1).await.unwrap().entries.len(), 2);
    assert_eq!(fetcher.requests_sent(), 2);
}

#[tokio::test]
async fn test_retry_after_is_honored() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page_json(1, 2)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, 20, 1);
    config.api.max_delay_ms = 5_000;
    let fetcher = build_fetcher(&config).unwrap();

    let started = Instant::now();
    fetcher.fetch(1).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(fetcher.requests_sent(), 2);
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 20, 1);
    let fetcher = build_fetcher(&config).unwrap();

    let result = fetcher.fetch(1).await;
    assert!(matches!(
        result,
        Err(FetchError::Auth {
            target: FetchTarget::Page(1)
        })
    ));
}

#[tokio::test]
async fn test_not_found_and_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 40, 1);
    let fetcher = build_fetcher(&config).unwrap();

    assert!(matches!(
        fetcher.fetch(1).await,
        Err(FetchError::NotFound { .. })
    ));
    assert!(matches!(
        fetcher.fetch(2).await,
        Err(FetchError::Rejected { status: 422, .. })
    ));
}

#[tokio::test]
async fn test_missing_api_key_sends_nothing() {
    let mock_server = MockServer::start().await;

    let mut config = create_test_config(&mock_server, 20, 1);
    config.api.api_key = None;
    let fetcher = build_fetcher(&config).unwrap();

    assert!(matches!(
        fetcher.fetch(1).await,
        Err(FetchError::Auth { .. })
    ));
    assert_eq!(fetcher.requests_sent(), 0);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_genres() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .and(query_param("language", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [
                {"id": 28, "name": "Action"},
                {"id": 35, "name": "Comedy"},
                {"id": 99, "name": ""}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 20, 1);
    let fetcher = build_fetcher(&config).unwrap();

    let genres = fetcher.fetch_genres().await.unwrap();
    assert_eq!(genres.len(), 2);
    assert_eq!(genres.get(28), Some("Action"));
    assert_eq!(genres.get(99), None);
}
