//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a listing endpoint, item pages and media
//! streams, and run full harvests through `CrawlManager` with a media
//! processor that concatenates its inputs instead of calling ffmpeg.

use async_trait::async_trait;
use media_harvest::config::{
    CollectionEntry, Config, CrawlerConfig, DownloadConfig, HistoryConfig, MediaConfig, SourceConfig,
};
use media_harvest::crawler::CrawlManager;
use media_harvest::download::{plan_chunks, HttpTransport};
use media_harvest::pipeline::MediaProcessor;
use media_harvest::{HarvestError, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHUNK_SIZE: u64 = 4;

/// Writes the concatenation of its inputs
#[derive(Default)]
struct ConcatProcessor {
    merges: AtomicUsize,
}

#[async_trait]
impl MediaProcessor for ConcatProcessor {
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<i32> {
        let mut merged = Vec::new();
        for input in inputs {
            merged.extend(tokio::fs::read(input).await?);
        }
        tokio::fs::write(output, merged).await?;
        self.merges.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

/// Creates a test configuration for the given mock server and collections
fn create_test_config(server: &MockServer, dir: &TempDir, collections: &[(&str, &str)]) -> Config {
    Config {
        crawler: CrawlerConfig {
            output_dir: dir.path().join("out").to_string_lossy().into_owned(),
            override_existing: false,
            ergodic: false,
            page_delay: 0,
            page_jitter_ms: 0,
            item_workers: 2,
        },
        download: DownloadConfig {
            chunk_size: CHUNK_SIZE,
            chunk_workers: 3,
            cookie: "SESSDATA=test".to_string(),
            ..DownloadConfig::default()
        },
        source: SourceConfig {
            listing_url: format!("{}/x/space/arc/search?mid={{collection}}&pn={{page}}", server.uri()),
            item_url: format!("{}/video/{{id}}", server.uri()),
        },
        history: HistoryConfig {
            folder: dir.path().join("history").to_string_lossy().into_owned(),
            ..HistoryConfig::default()
        },
        media: MediaConfig::default(),
        collections: collections
            .iter()
            .map(|(id, name)| CollectionEntry {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect(),
    }
}

fn listing(items: &[(&str, &str)], page: u32, count: u64) -> serde_json::Value {
    json!({
        "code": 0,
        "message": "0",
        "data": {
            "list": {
                "vlist": items
                    .iter()
                    .map(|(bvid, title)| json!({"bvid": bvid, "title": title}))
                    .collect::<Vec<_>>()
            },
            "page": {"pn": page, "ps": 2, "count": count}
        }
    })
}

/// Mounts the item page and both streams of one item
async fn mount_item(server: &MockServer, id: &str) {
    let playinfo = json!({
        "code": 0,
        "data": {"dash": {
            "video": [{"baseUrl": format!("{}/media/{}-v.m4s", server.uri(), id)}],
            "audio": [{"baseUrl": format!("{}/media/{}-a.m4s", server.uri(), id)}]
        }}
    });

    Mock::given(method("GET"))
        .and(path(format!("/video/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    "<html><head><script>window.__playinfo__={}</script></head><body></body></html>",
                    playinfo
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    for (suffix, body) in [("v", format!("video-{}", id)), ("a", format!("audio-{}", id))] {
        let route = format!("/media/{}-{}.m4s", id, suffix);
        Mock::given(method("HEAD"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone().into_bytes()))
            .mount(server)
            .await;

        let bytes = body.into_bytes();
        for range in plan_chunks(bytes.len() as u64, CHUNK_SIZE) {
            Mock::given(method("GET"))
                .and(path(route.as_str()))
                .and(header("range", range.header_value().as_str()))
                .respond_with(
                    ResponseTemplate::new(206)
                        .set_body_bytes(bytes[range.start as usize..=range.end as usize].to_vec()),
                )
                .mount(server)
                .await;
        }
    }
}

fn expected_output(id: &str) -> Vec<u8> {
    let mut bytes = format!("video-{}audio-{}", id, id).into_bytes();
    if let Some(last) = bytes.last_mut() {
        *last = b'C';
    }
    bytes
}

fn manager(config: Config, processor: Arc<ConcatProcessor>) -> CrawlManager {
    let transport = Arc::new(HttpTransport::new(&config.download).expect("Failed to build transport"));
    CrawlManager::new(Arc::new(config), transport, processor)
}

#[tokio::test]
async fn test_two_runs_only_fetch_new_items() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    for id in ["BV1", "BV2", "BV3", "BV4"] {
        mount_item(&server, id).await;
    }

    // First run walks two pages; the second run sees one more item at the top.
    for (page, items, count) in [
        (1, vec![("BV3", "Third"), ("BV2", "Second")], 3),
        (2, vec![("BV1", "First")], 3),
    ] {
        Mock::given(method("GET"))
            .and(path("/x/space/arc/search"))
            .and(query_param("mid", "100"))
            .and(query_param("pn", page.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(&items, page, count)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    for (page, items) in [
        (1, vec![("BV4", "Fourth"), ("BV3", "Third")]),
        (2, vec![("BV2", "Second"), ("BV1", "First")]),
    ] {
        Mock::given(method("GET"))
            .and(path("/x/space/arc/search"))
            .and(query_param("mid", "100"))
            .and(query_param("pn", page.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(&items, page, 4)))
            .mount(&server)
            .await;
    }

    let config = create_test_config(&server, &dir, &[("100", "someone")]);
    let out = dir.path().join("out").join("someone");
    let history_file = dir.path().join("history").join("someone-100.txt");

    let processor = Arc::new(ConcatProcessor::default());
    let reports = manager(config.clone(), Arc::clone(&processor))
        .run()
        .await
        .expect("First run failed");

    assert_eq!(reports.len(), 1);
    let mut dispatched = reports[0].dispatched.clone();
    dispatched.sort();
    assert_eq!(dispatched, vec!["BV1", "BV2", "BV3"]);
    assert_eq!(reports[0].succeeded, 3);
    assert_eq!(reports[0].pages_visited, 2);
    assert!(!reports[0].frontier_reached);
    assert_eq!(processor.merges.load(Ordering::SeqCst), 3);

    assert_eq!(std::fs::read(out.join("First.mp4")).expect("Missing output"), expected_output("BV1"));
    assert_eq!(std::fs::read(out.join("Second.mp4")).expect("Missing output"), expected_output("BV2"));
    assert_eq!(std::fs::read(out.join("Third.mp4")).expect("Missing output"), expected_output("BV3"));
    assert!(!out.join("#_First.mp4").exists(), "intermediate video should be removed");
    assert!(!out.join("#_First.mp3").exists(), "intermediate audio should be removed");

    let ledger = std::fs::read_to_string(&history_file).expect("Missing history");
    assert_eq!(ledger.lines().count(), 3);
    assert!(ledger.lines().any(|line| line.starts_with("BV1;First;")));
    assert!(ledger.lines().any(|line| line.starts_with("BV2;Second;")));
    assert!(ledger.lines().any(|line| line.starts_with("BV3;Third;")));

    // Second run: BV3 is the frontier, so only BV4 is fetched.
    let processor = Arc::new(ConcatProcessor::default());
    let reports = manager(config, Arc::clone(&processor))
        .run()
        .await
        .expect("Second run failed");

    assert_eq!(reports[0].dispatched, vec!["BV4"]);
    assert!(reports[0].frontier_reached);
    assert_eq!(reports[0].pages_visited, 1);
    assert_eq!(processor.merges.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read(out.join("Fourth.mp4")).expect("Missing output"), expected_output("BV4"));

    let ledger = std::fs::read_to_string(&history_file).expect("Missing history");
    assert_eq!(ledger.lines().count(), 4);
}

#[tokio::test]
async fn test_item_without_media_is_not_recorded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_item(&server, "BV7").await;
    Mock::given(method("GET"))
        .and(path("/video/BV8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><script>window.__playinfo__={}</script></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/space/arc/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(&[("BV8", "Broken"), ("BV7", "Fine")], 1, 2)))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir, &[("200", "other")]);
    let processor = Arc::new(ConcatProcessor::default());
    let reports = manager(config, processor).run().await.expect("Run failed");

    assert_eq!(reports[0].succeeded, 1);
    assert_eq!(reports[0].failed, 1);

    let ledger = std::fs::read_to_string(dir.path().join("history").join("other-200.txt")).expect("Missing history");
    assert!(ledger.contains("BV7"));
    assert!(!ledger.contains("BV8"));
}

#[tokio::test]
async fn test_failing_collection_does_not_stop_others() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_item(&server, "BV5").await;
    Mock::given(method("GET"))
        .and(path("/x/space/arc/search"))
        .and(query_param("mid", "300"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": -352, "message": "risk control"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/space/arc/search"))
        .and(query_param("mid", "301"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(&[("BV5", "Fifth")], 1, 1)))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir, &[("300", "blocked"), ("301", "open")]);
    let result = manager(config, Arc::new(ConcatProcessor::default())).run().await;

    match result {
        Err(HarvestError::Enumeration { collection, .. }) => assert!(collection.contains("blocked")),
        other => panic!("Expected an enumeration error, got {:?}", other.map(|r| r.len())),
    }
    assert!(dir.path().join("out").join("open").join("Fifth.mp4").exists());
}
