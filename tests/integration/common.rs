//! Shared helpers for the integration tests

use serde_json::{json, Value};
use tmdb_scraper::config::Config;
use wiremock::MockServer;

/// A v3-style key, sent as the `api_key` query parameter
pub const TEST_KEY: &str = "0123456789abcdef0123456789abcdef";

/// Creates a configuration pointed at the mock server
///
/// Delays are kept short and the quota generous so tests run quickly.
pub fn create_test_config(server: &MockServer, target_count: usize, concurrency: usize) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.api_key = Some(TEST_KEY.to_string());
    config.api.requests_per_window = 1000;
    config.api.window_ms = 1000;
    config.api.timeout_secs = 5;
    config.api.connect_timeout_secs = 5;
    config.api.base_delay_ms = 10;
    config.api.max_delay_ms = 50;
    config.scraper.target_count = target_count;
    config.scraper.concurrency = concurrency;
    config
}

/// One discover entry
pub fn movie_json(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Movie {}", id),
        "original_title": format!("Original {}", id),
        "release_date": "2019-05-17",
        "vote_average": 7.5,
        "overview": format!("Overview of movie {}", id),
        "genre_ids": [28, 12],
        "adult": false
    })
}

/// A discover page holding the given ids
pub fn page_json(page: u32, total_pages: u32, ids: impl IntoIterator<Item = u64>) -> Value {
    let results: Vec<Value> = ids.into_iter().map(movie_json).collect();
    json!({
        "page": page,
        "total_pages": total_pages,
        "total_results": total_pages * 20,
        "results": results
    })
}

/// A full page of 20 consecutive ids, numbered like the page position
pub fn full_page_json(page: u32, total_pages: u32) -> Value {
    let first = u64::from(page - 1) * 20 + 1;
    page_json(page, total_pages, first..first + 20)
}

/// Page numbers of every discover request the server received, in order
pub async fn requested_pages(server: &MockServer) -> Vec<u32> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/discover/movie")
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
        .collect()
}
