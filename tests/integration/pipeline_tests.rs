//! End-to-end pipeline runs against a mock TMDb server

use crate::common::{create_test_config, full_page_json, page_json, requested_pages};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use tmdb_scraper::output::{read_csv, CsvWriter, OutputWriter};
use tmdb_scraper::scraper::{build_fetcher, Pipeline};
use tmdb_scraper::{run_pipeline, FetchError, FetchTarget, GenreMap, PipelineError, PipelineState};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts full pages `1..=pages` of a catalogue with `total_pages` pages
async fn mount_pages(server: &MockServer, pages: u32, total_pages: u32) {
    for page in 1..=pages {
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("page", page.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_page_json(page, total_pages)))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_target_45_fetches_three_pages() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 10, 10).await;

    let config = create_test_config(&mock_server, 45, 8);
    let records = run_pipeline(&config, GenreMap::tmdb_defaults())
        .await
        .unwrap();

    assert_eq!(records.len(), 45);
    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=45).collect::<Vec<u64>>());

    let mut pages = requested_pages(&mock_server).await;
    pages.sort_unstable();
    assert_eq!(pages, vec![1, 2, 3]);

    let first = &records[0];
    assert_eq!(first.title, "Movie 1");
    assert_eq!(first.year, Some(2019));
    assert_eq!(first.rating, 7.5);
    assert_eq!(first.genres, vec!["Action".to_string(), "Adventure".to_string()]);
}

#[tokio::test]
async fn test_order_survives_out_of_order_completion() {
    let mock_server = MockServer::start().await;

    // Earlier pages answer slower than later ones
    for page in 1..=4u32 {
        let delay = Duration::from_millis(u64::from(5 - page) * 60);
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("page", page.to_string().as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(full_page_json(page, 4))
                    .set_delay(delay),
            )
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server, 80, 4);
    let records = run_pipeline(&config, GenreMap::tmdb_defaults())
        .await
        .unwrap();

    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=80).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_fewer_movies_than_requested() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page_json(1, 2)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(2, 2, 21..=30)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 100, 1);
    let records = run_pipeline(&config, GenreMap::tmdb_defaults())
        .await
        .unwrap();

    assert_eq!(records.len(), 30);
    assert_eq!(requested_pages(&mock_server).await, vec![1, 2]);
}

#[tokio::test]
async fn test_not_found_past_the_end_with_parallel_fetches() {
    let mock_server = MockServer::start().await;

    // Real pages answer slowly; pages 3+ are unmounted and 404 at once
    for page in [1u32, 2] {
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("page", page.to_string().as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(full_page_json(page, 2))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server, 100, 8);
    let records = run_pipeline(&config, GenreMap::tmdb_defaults())
        .await
        .unwrap();

    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=40).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_not_found_inside_catalogue_fails_run() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 2, 5).await;

    let config = create_test_config(&mock_server, 100, 8);
    let result = run_pipeline(&config, GenreMap::tmdb_defaults()).await;

    assert!(matches!(
        result,
        Err(PipelineError::Fetch(FetchError::NotFound {
            target: FetchTarget::Page(3)
        }))
    ));
}

#[tokio::test]
async fn test_duplicates_across_pages_are_dropped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 3, 1..=20)))
        .mount(&mock_server)
        .await;

    // Popularity shifted between requests: ids 19 and 20 show up again
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(2, 3, 19..=38)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(3, 3, 39..=58)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 40, 2);
    let records = run_pipeline(&config, GenreMap::tmdb_defaults())
        .await
        .unwrap();

    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=40).collect::<Vec<u64>>());
    assert!(requested_pages(&mock_server).await.contains(&3));
}

#[tokio::test]
async fn test_auth_failure_stops_later_pages() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 2, 10).await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 100, 1);
    let result = run_pipeline(&config, GenreMap::tmdb_defaults()).await;

    assert!(matches!(
        result,
        Err(PipelineError::Fetch(FetchError::Auth {
            target: FetchTarget::Page(3)
        }))
    ));
    assert_eq!(requested_pages(&mock_server).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_auth_failure_does_not_wait_for_slow_pages() {
    let mock_server = MockServer::start().await;

    for page in [1u32, 2] {
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("page", page.to_string().as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(full_page_json(page, 10))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page_json(4, 10)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 100, 4);
    let fetcher = Arc::new(build_fetcher(&config).unwrap());
    let mut pipeline = Pipeline::new(
        config.scraper.clone(),
        Arc::clone(&fetcher),
        Arc::new(GenreMap::tmdb_defaults()),
    );

    let started = Instant::now();
    let result = pipeline.run().await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(
        result,
        Err(PipelineError::Fetch(FetchError::Auth { .. }))
    ));
    assert_eq!(pipeline.state(), PipelineState::Failed);

    // Nothing past the planned pages is ever requested
    let pages = requested_pages(&mock_server).await;
    assert!(pages.iter().all(|&page| page <= 5));
}

#[tokio::test]
async fn test_missing_api_key_fails_without_requests() {
    let mock_server = MockServer::start().await;

    let mut config = create_test_config(&mock_server, 20, 4);
    config.api.api_key = None;

    let result = run_pipeline(&config, GenreMap::tmdb_defaults()).await;
    assert!(matches!(
        result,
        Err(PipelineError::Fetch(FetchError::Auth { .. }))
    ));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scrape_to_csv() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 2, 2).await;

    let config = create_test_config(&mock_server, 25, 2);
    let records = run_pipeline(&config, GenreMap::tmdb_defaults())
        .await
        .unwrap();
    assert_eq!(records.len(), 25);

    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("movies.csv");
    let written = CsvWriter::new(&csv_path, false).write(&records).unwrap();
    assert_eq!(written, 25);

    let rows = read_csv(&csv_path).unwrap();
    assert_eq!(rows.len(), 25);
    assert_eq!(rows[0].title, "Movie 1");
    assert_eq!(rows[0].year, Some(2019));
    assert_eq!(rows[0].genre, "Action, Adventure");
    assert_eq!(rows[24].title, "Movie 25");
}
