use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::fetcher::{FailureKind, FetchError, FetchOptions, Fetcher, RecordSource};
use crate::paginator::{Navigation, PageLabel};
use crate::view::{FundingTable, ViewState};

/// Serves a single canned HTTP response and hands back the raw request.
async fn serve_once(status_line: &str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = tokio::spawn(async move {
        let (mut socket, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(_) => return String::new(),
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&request).to_string()
    });
    (format!("http://{addr}/frontend-assignment.json"), handle)
}

fn dataset(n: usize) -> String {
    let rows: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{"s.no":{i},"amt.pledged":{},"percentage.funded":{}}}"#,
                1000 + i * 7,
                i * 3
            )
        })
        .collect();
    format!("[{}]", rows.join(","))
}

fn fetcher_for(url: &str) -> Fetcher {
    Fetcher::new(FetchOptions {
        url: url.to_string(),
        timeout_seconds: 5,
        ..FetchOptions::default()
    })
    .unwrap()
}

#[tokio::test]
async fn fetch_preserves_server_order() {
    let body = r#"[{"s.no":9,"amt.pledged":1,"percentage.funded":2},
                   {"s.no":2,"amt.pledged":3.5,"percentage.funded":4},
                   {"s.no":5,"amt.pledged":5,"percentage.funded":6}]"#;
    let (url, _server) = serve_once("200 OK", body.to_string()).await;
    let records = fetcher_for(&url).fetch_records().await.unwrap();
    let order: Vec<i64> = records.iter().map(|r| r.sequence_number).collect();
    assert_eq!(order, vec![9, 2, 5]);
    assert_eq!(records[1].amount_pledged, 3.5);
}

#[tokio::test]
async fn non_success_status_is_a_network_failure() {
    let (url, _server) = serve_once("404 Not Found", "{}".to_string()).await;
    let err = fetcher_for(&url).fetch_records().await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert_eq!(err.kind(), FailureKind::Network);
}

#[tokio::test]
async fn html_body_is_a_parse_failure() {
    let (url, _server) = serve_once("200 OK", "<html>oops</html>".to_string()).await;
    let err = fetcher_for(&url).fetch_records().await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidJson { .. }));
    assert_eq!(err.kind(), FailureKind::Parse);
}

#[tokio::test]
async fn wrong_json_shape_is_a_parse_failure() {
    let (url, _server) = serve_once("200 OK", r#"{"data":[]}"#.to_string()).await;
    let err = fetcher_for(&url).fetch_records().await.unwrap_err();
    assert!(matches!(err, FetchError::UnexpectedShape { .. }));
    assert_eq!(err.kind(), FailureKind::Parse);
}

#[tokio::test]
async fn refused_connection_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = fetcher_for(&format!("http://{addr}/data.json"))
        .fetch_records()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network { .. }));
    assert_eq!(err.kind(), FailureKind::Network);
}

#[tokio::test]
async fn request_carries_custom_header() {
    let (url, server) = serve_once("200 OK", "[]".to_string()).await;
    let fetcher = Fetcher::new(FetchOptions {
        url,
        timeout_seconds: 5,
        header: Some("X-Api-Key: secret".to_string()),
        ..FetchOptions::default()
    })
    .unwrap();
    assert!(fetcher.fetch_records().await.unwrap().is_empty());

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /frontend-assignment.json http/1.1"));
    assert!(request.contains("x-api-key: secret"));
    assert!(request.contains("user-agent: fundtable/"));
}

#[tokio::test]
async fn twenty_three_records_paginate_into_five_pages() {
    colored::control::set_override(false);
    let (url, _server) = serve_once("200 OK", dataset(23)).await;
    let mut table = FundingTable::new(5);
    assert!(table.mount(&fetcher_for(&url)).await);
    assert!(!table.is_loading());

    let page = table.page();
    assert_eq!(page.total_pages, 5);
    let shown: Vec<i64> = page.items.iter().map(|r| r.sequence_number).collect();
    assert_eq!(shown, vec![0, 1, 2, 3, 4]);
    assert_eq!(
        page.labels,
        vec![
            PageLabel::Page(1),
            PageLabel::Page(2),
            PageLabel::Page(3),
            PageLabel::Ellipsis,
            PageLabel::Page(5)
        ]
    );

    table.navigate(Navigation::Goto(3));
    let view = crate::render::render_view(&table.state());
    assert!(view.contains("< Previous  1  2  [3]  4  5  Next >"));
    assert!(view.contains("Page 3 of 5 :: records 11-15 of 23"));
}

#[tokio::test]
async fn empty_dataset_disables_navigation() {
    let (url, _server) = serve_once("200 OK", "[]".to_string()).await;
    let mut table = FundingTable::new(5);
    table.mount(&fetcher_for(&url)).await;

    let page = table.page();
    assert_eq!(page.total_pages, 0);
    assert!(page.items.is_empty());
    assert!(!page.has_previous);
    assert!(!page.has_next);
    assert!(table.error().is_none());
}

#[tokio::test]
async fn rejected_fetch_renders_empty_table_with_error() {
    colored::control::set_override(false);
    let (url, _server) = serve_once("500 Internal Server Error", "{}".to_string()).await;
    let mut table = FundingTable::new(5);
    table.mount(&fetcher_for(&url)).await;

    assert!(!table.is_loading());
    assert!(table.records().is_empty());
    match table.state() {
        ViewState::Failed { error, page } => {
            assert_eq!(error.kind(), FailureKind::Network);
            assert!(page.items.is_empty());
        }
        other => panic!("expected failed state, got {other:?}"),
    }
    let view = crate::render::render_view(&table.state());
    assert!(view.contains("HTTP 500"));
    assert!(view.contains("S No"));
}
