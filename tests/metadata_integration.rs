//! Integration tests for the metadata server probe using wiremock
//!
//! These tests verify the probe against a mocked metadata server, covering
//! the status codes and bodies a real server (or a non-GCP network) produces.

use gcloud_core::project::metadata::METADATA_REQUEST_HEADER;
use gcloud_core::project::MetadataProbe;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT_PATH: &str = "/computeMetadata/v1/project/project-id";

fn probe_for(server: &MockServer) -> MetadataProbe {
    MetadataProbe::new().with_endpoint(format!("{}{}", server.uri(), PROJECT_PATH))
}

/// Test module for metadata probe integration tests
mod metadata_probe_tests {
    use super::*;

    /// Test 200 response returns the first line of the body
    #[tokio::test]
    async fn test_200_returns_project_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROJECT_PATH))
            .and(header(METADATA_REQUEST_HEADER, "True"))
            .respond_with(ResponseTemplate::new(200).set_body_string("proj-meta\nignored\n"))
            .expect(1)
            .mount(&server)
            .await;

        let project = probe_for(&server).project_id().await;
        assert_eq!(project.as_deref(), Some("proj-meta"));
    }

    /// Test the probe does not answer without the metadata header
    #[tokio::test]
    async fn test_header_is_required() {
        let server = MockServer::start().await;

        // Only requests carrying the header match; anything else gets wiremock's 404
        Mock::given(method("GET"))
            .and(path(PROJECT_PATH))
            .and(header(METADATA_REQUEST_HEADER, "True"))
            .respond_with(ResponseTemplate::new(200).set_body_string("proj-meta"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}{}", server.uri(), PROJECT_PATH))
            .send()
            .await
            .expect("Request should complete");
        assert_eq!(response.status(), 404);

        assert_eq!(probe_for(&server).project_id().await.as_deref(), Some("proj-meta"));
    }

    /// Test 404 response yields nothing
    #[tokio::test]
    async fn test_404_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROJECT_PATH))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(probe_for(&server).project_id().await, None);
    }

    /// Test any non-200 success status yields nothing
    #[tokio::test]
    async fn test_204_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROJECT_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        assert_eq!(probe_for(&server).project_id().await, None);
    }

    /// Test server errors are not retried
    #[tokio::test]
    async fn test_500_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROJECT_PATH))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(probe_for(&server).project_id().await, None);
    }

    /// Test empty body yields nothing
    #[tokio::test]
    async fn test_empty_body_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROJECT_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert_eq!(probe_for(&server).project_id().await, None);
    }

    /// Test a blank first line is returned as is
    #[tokio::test]
    async fn test_blank_first_line_is_returned() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROJECT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("\nproj-meta\n"))
            .mount(&server)
            .await;

        assert_eq!(probe_for(&server).project_id().await.as_deref(), Some(""));
    }

    /// Test a slow server is cut off by the timeout
    #[tokio::test]
    async fn test_timeout_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROJECT_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("too-late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let project = probe_for(&server)
            .with_timeout(Duration::from_millis(200))
            .project_id()
            .await;

        assert_eq!(project, None);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    /// Test a disabled probe sends nothing
    #[tokio::test]
    async fn test_disabled_probe_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("proj-meta"))
            .expect(0)
            .mount(&server)
            .await;

        assert_eq!(MetadataProbe::disabled().project_id().await, None);
    }
}
