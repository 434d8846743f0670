//! Integration tests for the scraper
//!
//! These tests use wiremock to stand in for the TMDb API and drive the
//! fetcher and the full pipeline over real HTTP.

mod common;
mod fetch_tests;
mod pipeline_tests;
