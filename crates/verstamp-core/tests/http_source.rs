use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use verstamp_core::{
    CheckConfig, CheckError, Environment, HttpVersionSource, VersionChecker, VersionSource,
};

/// Serves one canned HTTP response and hands back the raw request.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let mut request = Vec::new();
        let mut buffer = [0_u8; 1024];
        loop {
            let read = socket.read(&mut buffer).await.expect("read request");
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buffer[..read]);
            if request.windows(4).any(|window| window == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        let _ = socket.shutdown().await;

        String::from_utf8_lossy(&request).to_ascii_lowercase()
    });

    (format!("http://{addr}/version.json"), handle)
}

fn source(url: &str) -> HttpVersionSource {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("build client");
    HttpVersionSource::new(client, reqwest::Url::parse(url).expect("valid url"))
}

#[tokio::test]
async fn fetches_latest_version_with_cache_busting_headers() {
    let (url, server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"version":"1.4.0","updateUrl":"https://example.com/notes"}"#,
    )
    .await;

    let latest = source(&url)
        .fetch_latest(Environment::Development)
        .await
        .expect("fetch should succeed");

    assert_eq!(latest.version, "1.4.0");
    assert_eq!(latest.update_url.as_deref(), Some("https://example.com/notes"));

    let request = server.await.expect("server task");
    assert!(request.starts_with("get /version.json"));
    assert!(request.contains("pragma: no-cache"));
    assert!(request.contains("cache-control: no-cache"));
    assert!(request.contains("x-environment: development"));
}

#[tokio::test]
async fn non_success_status_is_an_http_error() {
    let (url, server) = serve_once("HTTP/1.1 503 Service Unavailable", "maintenance").await;

    let error = source(&url)
        .fetch_latest(Environment::Production)
        .await
        .expect_err("503 should fail");

    match error {
        CheckError::HttpStatus {
            status,
            body_snippet,
        } => {
            assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body_snippet, ": maintenance");
        }
        other => panic!("expected HTTP status error, got {other}"),
    }
    server.await.expect("server task");
}

#[tokio::test]
async fn body_without_version_is_a_parse_error() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", r#"{"latest":"1.0.0"}"#).await;

    let error = source(&url)
        .fetch_latest(Environment::Production)
        .await
        .expect_err("missing version should fail");

    assert!(matches!(error, CheckError::Parse(_)));
    server.await.expect("server task");
}

#[tokio::test]
async fn checker_reports_errors_and_propagates_them() {
    let (url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "").await;
    let reported = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);

    let checker = VersionChecker::with_source(
        CheckConfig::new(url.clone()).with_on_error(move |error| {
            sink.lock().expect("sink lock").push(error.to_string());
        }),
        Arc::new(source(&url)),
    )
    .expect("config should be valid");

    let error = checker.check().await.expect_err("500 should fail");

    assert!(matches!(error, CheckError::HttpStatus { .. }));
    assert_eq!(
        *reported.lock().expect("sink lock"),
        vec!["failed to fetch version info: HTTP 500 Internal Server Error".to_string()]
    );
    server.await.expect("server task");
}

#[tokio::test]
async fn checker_compares_against_served_version() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", r#"{"version":"1.10.0"}"#).await;

    let checker = VersionChecker::with_source(
        CheckConfig::new(url.clone()).with_current_version("1.9.0"),
        Arc::new(source(&url)),
    )
    .expect("config should be valid");

    let result = checker.check().await.expect("check should succeed");

    assert!(result.has_new_version);
    assert_eq!(result.current_version, "1.9.0");
    assert_eq!(result.latest_version, "1.10.0");
    assert_eq!(result.update_url, None);
    server.await.expect("server task");
}
