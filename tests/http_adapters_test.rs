//! HTTP adapters against a mock server

use almoner::adapters::directory::{DirectorySource, HttpDirectorySource};
use almoner::adapters::extraction::{ExtractionClient, HttpExtractionClient};
use almoner::config::{secret_string, DirectoryConfig, ExtractionConfig};
use almoner::core::batch::BatchPlanner;
use almoner::domain::{BatchContent, ExtractionError, MatchError, SourceDocument};
use mockito::{Matcher, Server};
use std::time::Duration;

fn extraction_config(base_url: String) -> ExtractionConfig {
    ExtractionConfig {
        base_url,
        api_key: Some(secret_string("test-key".to_string())),
        timeout_seconds: 5,
        max_concurrency: 2,
        pages_per_batch: 10,
    }
}

fn directory_config(base_url: String) -> DirectoryConfig {
    DirectoryConfig {
        base_url,
        api_key: None,
        cache_ttl_seconds: 300,
        timeout_seconds: 5,
    }
}

fn slip_content() -> BatchContent {
    let document = SourceDocument::new("slip-0001.png", 1, vec![0x89, 0x50, 0x4e, 0x47]);
    BatchPlanner::default().plan(&[document]).batches[0].content()
}

#[tokio::test]
async fn test_extract_returns_records() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/extract")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJsonString(
            r#"{"document_name": "slip-0001.png", "kind": "image"}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"records": [
                {"donor_name": "Jane Doe", "amount": "$50.00", "check_number": "1201"},
                {"donor_name": "Acme Holdings", "amount": "250"}
            ]}"#,
        )
        .create_async()
        .await;

    let client = HttpExtractionClient::new(&extraction_config(server.url())).unwrap();
    let records = client.extract(&slip_content()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].donor_name.as_deref(), Some("Jane Doe"));
    assert_eq!(records[0].check_number.as_deref(), Some("1201"));
    assert_eq!(records[1].amount.as_deref(), Some("250"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_extract_server_error_is_retryable() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/extract")
        .with_status(503)
        .with_body("Service Unavailable")
        .create_async()
        .await;

    let client = HttpExtractionClient::new(&extraction_config(server.url())).unwrap();
    let err = client.extract(&slip_content()).await.unwrap_err();

    assert!(matches!(err, ExtractionError::Server { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_extract_client_error_is_fatal() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/extract")
        .with_status(400)
        .with_body("unsupported image")
        .create_async()
        .await;

    let client = HttpExtractionClient::new(&extraction_config(server.url())).unwrap();
    let err = client.extract(&slip_content()).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_extract_rate_limit_reads_retry_after() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/extract")
        .with_status(429)
        .with_header("retry-after", "7")
        .create_async()
        .await;

    let client = HttpExtractionClient::new(&extraction_config(server.url())).unwrap();
    let err = client.extract(&slip_content()).await.unwrap_err();

    assert_eq!(
        err,
        ExtractionError::RateLimited {
            retry_after: Some(Duration::from_secs(7))
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_extract_malformed_body() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/extract")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let client = HttpExtractionClient::new(&extraction_config(server.url())).unwrap();
    let err = client.extract(&slip_content()).await.unwrap_err();

    assert!(matches!(err, ExtractionError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_directory_fetch_all() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/customers")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"customers": [
                {"id": "58", "display_name": "Smith, John", "email": "john@example.org"},
                {"id": "59", "display_name": "Acme Holdings", "company_name": "Acme Holdings LLC"}
            ]}"#,
        )
        .create_async()
        .await;

    let source = HttpDirectorySource::new(&directory_config(server.url())).unwrap();
    let entries = source.fetch_all().await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id.as_str(), "58");
    assert_eq!(entries[0].email.as_deref(), Some("john@example.org"));
    assert_eq!(entries[1].company_name.as_deref(), Some("Acme Holdings LLC"));
}

#[tokio::test]
async fn test_directory_fetch_failure_is_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/customers")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let source = HttpDirectorySource::new(&directory_config(server.url())).unwrap();
    let err = source.fetch_all().await.unwrap_err();

    assert!(matches!(err, MatchError::DirectoryUnavailable(ref m) if m.contains("500")));
}

#[tokio::test]
async fn test_directory_lookup_hit_and_miss() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/customers")
        .match_query(Matcher::UrlEncoded("name".into(), "Jane Doe".into()))
        .with_status(200)
        .with_body(r#"{"id": "77", "display_name": "Doe, Jane"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/customers")
        .match_query(Matcher::UrlEncoded("name".into(), "Nobody".into()))
        .with_status(404)
        .create_async()
        .await;

    let source = HttpDirectorySource::new(&directory_config(server.url())).unwrap();

    let hit = source.lookup("Jane Doe").await.unwrap().unwrap();
    assert_eq!(hit.id.as_str(), "77");
    assert_eq!(source.lookup("Nobody").await.unwrap(), None);
}
