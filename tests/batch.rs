use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;
use tributary::app::{AppContext, ErrorKind};
use tributary::cache::{MetadataStore, SidecarStore};
use tributary::config::{FetchSettings, Manifest};
use tributary::domain::{FetchItem, ItemState};
use tributary::fetcher::{FetchResponse, Fetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_with_etag(server: &MockServer, route: &str, etag: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("If-None-Match", etag))
        .respond_with(ResponseTemplate::new(304))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", etag)
                .set_body_bytes(body.to_vec()),
        )
        .with_priority(2)
        .mount(server)
        .await;
}

fn context(output_dir: &Path, parallel: usize, deadline_secs: u64) -> AppContext {
    let settings = FetchSettings {
        parallel,
        deadline_secs,
        ..Default::default()
    };
    AppContext::with_settings(output_dir.to_path_buf(), &settings).unwrap()
}

#[tokio::test]
async fn test_second_run_is_fully_not_modified() {
    let server = MockServer::start().await;
    serve_with_etag(&server, "/rust.svg", "\"r1\"", b"<svg>rust</svg>").await;
    serve_with_etag(&server, "/go.svg", "\"g1\"", b"<svg>go</svg>").await;
    serve_with_etag(&server, "/zig.svg", "\"z1\"", b"<svg>zig</svg>").await;

    let dir = tempdir().unwrap();
    let items = vec![
        FetchItem::new("langs/rust.svg", format!("{}/rust.svg", server.uri())),
        FetchItem::new("langs/go.svg", format!("{}/go.svg", server.uri())),
        FetchItem::new("zig.svg", format!("{}/zig.svg", server.uri())),
    ];
    let ctx = context(dir.path(), 2, 30);

    let first = ctx.runner.run(&items).await;
    assert_eq!(first.len(), 3);
    assert_eq!(first.updated_count(), 3);
    assert!(!first.has_failures());
    for (i, result) in first.iter().enumerate() {
        assert_eq!(result.path, items[i].path);
        assert!(result.status.contains("200"));
    }
    assert_eq!(
        std::fs::read(dir.path().join("langs/go.svg")).unwrap(),
        b"<svg>go</svg>"
    );

    let second = ctx.runner.run(&items).await;
    assert_eq!(second.updated_count(), 0);
    assert!(!second.has_failures());
    assert!(second.iter().all(|r| r.state() == ItemState::NotModified));
}

#[tokio::test]
async fn test_cached_validators_round_trip() {
    let server = MockServer::start().await;
    serve_with_etag(&server, "/logo.svg", "\"abc\"", b"<svg/>").await;

    let dir = tempdir().unwrap();
    let item = FetchItem::new("logo.svg", format!("{}/logo.svg", server.uri()));
    let ctx = context(dir.path(), 1, 30);

    ctx.runner.run(std::slice::from_ref(&item)).await;

    let meta = SidecarStore::new()
        .load(&dir.path().join("logo.svg"))
        .await
        .unwrap();
    assert_eq!(meta.etag.as_deref(), Some("\"abc\""));
    assert_eq!(meta.source_url, item.url);

    let response = ctx
        .fetcher
        .fetch(&item.url, meta.etag.as_deref(), meta.last_modified.as_deref())
        .await
        .unwrap();
    assert!(matches!(
        response,
        FetchResponse::NotModified { .. }
    ));
}

#[tokio::test]
async fn test_failures_stay_local_to_their_item() {
    let server = MockServer::start().await;
    serve_with_etag(&server, "/ok.svg", "\"ok\"", b"ok").await;
    Mock::given(method("GET"))
        .and(path("/gone.svg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("gone.svg"), b"kept").unwrap();
    let items = vec![
        FetchItem::new("gone.svg", format!("{}/gone.svg", server.uri())),
        FetchItem::new("ok.svg", format!("{}/ok.svg", server.uri())),
    ];

    let batch = context(dir.path(), 2, 30).runner.run(&items).await;

    assert_eq!(batch[0].state(), ItemState::Failed);
    assert_eq!(batch[0].error.as_ref().unwrap().kind(), ErrorKind::Network);
    assert!(!batch[0].updated);
    assert_eq!(std::fs::read(dir.path().join("gone.svg")).unwrap(), b"kept");
    assert_eq!(batch[1].state(), ItemState::Replaced);
}

#[tokio::test]
async fn test_batch_deadline_keeps_completed_results() {
    let server = MockServer::start().await;
    serve_with_etag(&server, "/fast.svg", "\"f\"", b"fast").await;
    Mock::given(method("GET"))
        .and(path("/slow.svg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow".to_vec())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let items = vec![
        FetchItem::new("fast.svg", format!("{}/fast.svg", server.uri())),
        FetchItem::new("slow.svg", format!("{}/slow.svg", server.uri())),
        FetchItem::new("never.svg", format!("{}/fast.svg", server.uri())),
    ];

    let started = std::time::Instant::now();
    let batch = context(dir.path(), 1, 1).runner.run(&items).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[0].state(), ItemState::Replaced);
    assert_eq!(batch[1].error.as_ref().unwrap().kind(), ErrorKind::Deadline);
    assert_eq!(batch[2].error.as_ref().unwrap().kind(), ErrorKind::Deadline);
    assert!(!dir.path().join("slow.svg").exists());
    assert!(!dir.path().join("never.svg").exists());
}

#[tokio::test]
async fn test_manifest_drives_a_batch() {
    let server = MockServer::start().await;
    serve_with_etag(&server, "/a.svg", "\"a\"", b"a").await;

    let dir = tempdir().unwrap();
    let content = format!(
        "output_dir = {:?}\n\n[fetch]\nparallel = 2\n\n[[items]]\npath = \"nested/a.svg\"\nurl = \"{}/a.svg\"\n",
        dir.path().display().to_string(),
        server.uri()
    );
    let manifest = Manifest::from_toml_str(&content).unwrap();

    let ctx = AppContext::new(&manifest).unwrap();
    let batch = ctx.runner.run(&manifest.items).await;

    assert_eq!(batch.updated_count(), 1);
    assert!(dir.path().join("nested/a.svg").exists());
    assert!(dir.path().join("nested/a.svg.meta.json").exists());
}

#[tokio::test]
async fn test_maximum_deadline_in_manifest_runs_to_completion() {
    let server = MockServer::start().await;
    serve_with_etag(&server, "/a.svg", "\"a\"", b"a").await;

    let dir = tempdir().unwrap();
    let content = format!(
        "output_dir = {:?}\n\n[fetch]\ndeadline_secs = {}\n\n[[items]]\npath = \"a.svg\"\nurl = \"{}/a.svg\"\n",
        dir.path().display().to_string(),
        u64::MAX,
        server.uri()
    );
    let manifest = Manifest::from_toml_str(&content).unwrap();
    assert_eq!(manifest.fetch.deadline_secs, u64::MAX);

    let ctx = AppContext::new(&manifest).unwrap();
    let batch = ctx.runner.run(&manifest.items).await;

    assert_eq!(batch.len(), 1);
    assert_eq!(batch.updated_count(), 1);
    assert!(batch[0].error.is_none());
}
