//! Integration tests for the chunked downloader
//!
//! These tests drive `HttpTransport` against a wiremock server that answers
//! the size probe and each byte-range request separately.

use media_harvest::config::DownloadConfig;
use media_harvest::download::{ChunkedDownloader, DownloadSpec, HeaderList, HttpTransport};
use media_harvest::HarvestError;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYLOAD: &[u8] = b"0123456789";

/// Mounts a size probe and one mock per 4-byte range of `PAYLOAD`
async fn mount_payload(server: &MockServer, route: &str) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PAYLOAD))
        .mount(server)
        .await;

    for (start, end) in [(0usize, 3usize), (4, 7), (8, 9)] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("range", format!("bytes={}-{}", start, end).as_str()))
            .and(header("accept-encoding", "identity"))
            .respond_with(
                ResponseTemplate::new(206)
                    .set_body_bytes(&PAYLOAD[start..=end])
                    .insert_header("content-range", format!("bytes {}-{}/{}", start, end, PAYLOAD.len()).as_str()),
            )
            .mount(server)
            .await;
    }
}

fn downloader(workers: usize) -> ChunkedDownloader {
    let transport = Arc::new(HttpTransport::new(&DownloadConfig::default()).expect("Failed to build transport"));
    ChunkedDownloader::new(transport).with_chunk_size(4).with_workers(workers)
}

fn spec(server: &MockServer, route: &str, dir: &TempDir) -> DownloadSpec {
    DownloadSpec {
        url: format!("{}{}", server.uri(), route),
        headers: HeaderList::new(),
        destination: dir.path().join("nested").join("stream.m4s"),
    }
}

#[tokio::test]
async fn test_download_in_ranges() {
    let server = MockServer::start().await;
    mount_payload(&server, "/v.m4s").await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let spec = spec(&server, "/v.m4s", &dir);

    let report = downloader(3).download(&spec).await.expect("Download failed");

    assert!(report.is_complete());
    assert_eq!(report.total_size, 10);
    assert_eq!(report.chunks_dispatched, 3);
    assert_eq!(report.bytes_written, 10);
    assert_eq!(std::fs::read(&spec.destination).expect("Missing output"), PAYLOAD);
}

#[tokio::test]
async fn test_one_and_many_workers_agree() {
    let server = MockServer::start().await;
    mount_payload(&server, "/v.m4s").await;

    let single_dir = TempDir::new().expect("Failed to create temp dir");
    let single = spec(&server, "/v.m4s", &single_dir);
    downloader(1).download(&single).await.expect("Download failed");

    let many_dir = TempDir::new().expect("Failed to create temp dir");
    let many = spec(&server, "/v.m4s", &many_dir);
    downloader(4).download(&many).await.expect("Download failed");

    assert_eq!(
        std::fs::read(&single.destination).expect("Missing output"),
        std::fs::read(&many.destination).expect("Missing output")
    );
}

#[tokio::test]
async fn test_resume_skips_written_ranges() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/a.m4s"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PAYLOAD))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a.m4s"))
        .and(header("range", "bytes=0-3"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(&PAYLOAD[0..4]))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a.m4s"))
        .and(header("range", "bytes=4-7"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(&PAYLOAD[4..8]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a.m4s"))
        .and(header("range", "bytes=8-9"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(&PAYLOAD[8..10]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let spec = spec(&server, "/a.m4s", &dir);
    std::fs::create_dir_all(spec.destination.parent().expect("No parent")).expect("Failed to create dir");
    std::fs::write(&spec.destination, &PAYLOAD[0..4]).expect("Failed to seed partial file");

    let report = downloader(2).download(&spec).await.expect("Download failed");

    assert_eq!(report.existing_len, 4);
    assert_eq!(report.chunks_dispatched, 2);
    assert_eq!(std::fs::read(&spec.destination).expect("Missing output"), PAYLOAD);
}

#[tokio::test]
async fn test_complete_file_is_left_alone() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/done.m4s"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PAYLOAD))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let spec = spec(&server, "/done.m4s", &dir);
    std::fs::create_dir_all(spec.destination.parent().expect("No parent")).expect("Failed to create dir");
    std::fs::write(&spec.destination, PAYLOAD).expect("Failed to seed file");

    let report = downloader(2).download(&spec).await.expect("Download failed");
    assert!(report.is_complete());
    assert_eq!(report.chunks_dispatched, 0);
}

#[tokio::test]
async fn test_failed_range_fails_download() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/broken.m4s"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PAYLOAD))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.m4s"))
        .and(header("range", "bytes=4-7"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.m4s"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(&PAYLOAD[0..4]))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let report = downloader(2)
        .download(&spec(&server, "/broken.m4s", &dir))
        .await
        .expect("Download should start");

    assert!(!report.is_complete());
    assert!(report.chunks_failed >= 1);
}

#[tokio::test]
async fn test_missing_target_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let result = downloader(2).download(&spec(&server, "/gone.m4s", &dir)).await;

    assert!(matches!(result, Err(HarvestError::HttpStatus { status: 404, .. })));
}
