use std::io::Write;

use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use davrun::errors::DavError;
use davrun::services::webdav::{DavSession, RetryConfig, WebDAVConfig, WebDAVSession};

const BASIC_TESTUSER: &str = "Basic dGVzdHVzZXI6c2VjcmV0";

fn config_for(server_uri: &str) -> WebDAVConfig {
    WebDAVConfig::new(
        server_uri.to_string(),
        Some("testuser".to_string()),
        Some("secret".to_string()),
    )
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 1,
        initial_delay_ms: 10,
        max_delay_ms: 20,
        backoff_multiplier: 2.0,
        rate_limit_backoff_ms: 10,
    }
}

fn session_for(server_uri: &str) -> WebDAVSession {
    WebDAVSession::create_with_retry(config_for(server_uri), fast_retry())
        .expect("session should build")
}

#[tokio::test]
async fn exists_maps_404_to_false() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/docs/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    let present = session.exists("/docs/missing.pdf").await.unwrap();
    assert!(!present);
}

#[tokio::test]
async fn exists_maps_207_to_true() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/docs/report.pdf"))
        .and(header("Depth", "0"))
        .respond_with(ResponseTemplate::new(207))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    let present = session.exists("/docs/report.pdf").await.unwrap();
    assert!(present);
}

#[tokio::test]
async fn delete_of_absent_resource_is_a_not_found_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/docs/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    match session.delete("/docs/gone.pdf").await {
        Err(DavError::ResourceNotFound { path }) => assert_eq!(path, "/docs/gone.pdf"),
        other => panic!("expected not-found error, got {:?}", other),
    }
}

#[tokio::test]
async fn create_directory_with_missing_parent_is_a_precondition_failure() {
    let server = MockServer::start().await;
    Mock::given(method("MKCOL"))
        .and(path("/a/b/c"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    assert!(matches!(
        session.create_directory("/a/b/c").await,
        Err(DavError::PreconditionFailed { status: 409, .. })
    ));
}

#[tokio::test]
async fn copy_sends_destination_and_overwrite_headers() {
    let server = MockServer::start().await;
    Mock::given(method("COPY"))
        .and(path("/docs/a.pdf"))
        .and(header_exists("Destination"))
        .and(header("Overwrite", "T"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    session
        .copy("/docs/a.pdf", "/archive/a.pdf", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn move_without_overwrite_sends_the_f_flag() {
    let server = MockServer::start().await;
    Mock::given(method("MOVE"))
        .and(path("/docs/a.pdf"))
        .and(header("Overwrite", "F"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    session
        .move_resource("/docs/a.pdf", "/archive/a.pdf", false)
        .await
        .unwrap();
}

#[tokio::test]
async fn challenge_is_answered_with_credentials_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/docs/secure.pdf"))
        .and(header("Authorization", BASIC_TESTUSER))
        .respond_with(ResponseTemplate::new(207))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("PROPFIND"))
        .and(path("/docs/secure.pdf"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(5)
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    let present = session.exists("/docs/secure.pdf").await.unwrap();
    assert!(present);

    // Unauthenticated probe first, then the authenticated retry.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn preemptive_host_sends_credentials_on_the_first_request() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/docs/secure.pdf"))
        .and(header("Authorization", BASIC_TESTUSER))
        .respond_with(ResponseTemplate::new(207))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("PROPFIND"))
        .and(path("/docs/secure.pdf"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(5)
        .mount(&server)
        .await;

    let mut config = config_for(&server.uri());
    config.preemptive_authentication_host = Some("127.0.0.1".to_string());
    let session = WebDAVSession::create_with_retry(config, fast_retry()).unwrap();

    let present = session.exists("/docs/secure.pdf").await.unwrap();
    assert!(present);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn put_uploads_the_local_file_content() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/docs/upload.txt"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let mut local = tempfile::NamedTempFile::new().unwrap();
    local.write_all(b"payload").unwrap();

    let session = session_for(&server.uri());
    session
        .put(local.path(), "/docs/upload.txt")
        .await
        .unwrap();
}

#[tokio::test]
async fn put_of_unreadable_local_file_fails_without_a_request() {
    let server = MockServer::start().await;

    let session = session_for(&server.uri());
    let result = session
        .put(std::path::Path::new("/definitely/not/here.txt"), "/docs/x.txt")
        .await;

    assert!(matches!(result, Err(DavError::LocalFile { .. })));
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn server_errors_are_retried_then_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/docs/flaky.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    match session.exists("/docs/flaky.pdf").await {
        Err(DavError::ServerError { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected server error, got {:?}", other),
    }

    // One initial attempt plus one retry under the fast retry policy.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn paths_with_spaces_are_percent_encoded_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/reports/q1%202024/summary.txt"))
        .respond_with(ResponseTemplate::new(207))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    let present = session.exists("/reports/q1 2024/summary.txt").await.unwrap();
    assert!(present);
}
