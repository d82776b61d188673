//! End-to-end tests for the export pipeline.
//!
//! Each test spawns an isolated stub of the grove/asset services and runs
//! the full pipeline into temp directories, asserting on the files the
//! archive delivery actually consists of.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tempfile::TempDir;

use bandwagon_nb_export::materializer::Materializer;
use bandwagon_nb_export::pipeline::{ExportPipeline, PipelineSettings};
use bandwagon_nb_export::{GroveClient, RunSummary};

/// Call counters for the stub services.
#[derive(Default)]
struct StubCounters {
    artist_fetches: AtomicUsize,
    identity_fetches: AtomicUsize,
    publication_fetches: AtomicUsize,
    downloads: AtomicUsize,
}

struct StubState {
    base_url: String,
    counters: Arc<StubCounters>,
}

/// Stub grove + asset server.
///
/// Catalog contents:
/// - 2013: one track `Song_Title` whose artist 404s (the unknown-artist
///   scenario);
/// - 2014: one track whose audio asset answers 403;
/// - 2015: two tracks by the same uploader with working assets.
/// Publications always 404, so every record carries the synthesized one.
async fn spawn_stub_server() -> (String, Arc<StubCounters>) {
    let counters = Arc::new(StubCounters::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let state = Arc::new(StubState {
        base_url: base_url.clone(),
        counters: counters.clone(),
    });

    let app = Router::new()
        .route("/posts/{uid}", get(posts_handler))
        .route("/identities/{id}", get(identities_handler))
        .route("/publications/{label}", get(publications_handler))
        .route("/assets/tracks/{oid}/song.mp3", get(asset_handler))
        .route("/assets/forbidden.mp3", get(|| async { StatusCode::FORBIDDEN }))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base_url, counters)
}

fn track_json(state: &StubState, year: u16, oid: u32, name: &str, asset: &str) -> serde_json::Value {
    serde_json::json!({
        "post": {
            "uid": format!("post.track:apdm.bandwagon.{}.inner.oa${}", year, oid),
            "created_by": 42,
            "document": {
                "name": name,
                "audio_file_url": format!("{}{}", state.base_url, asset),
            }
        }
    })
}

async fn posts_handler(
    State(state): State<Arc<StubState>>,
    AxumPath(uid): AxumPath<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    if uid.starts_with("post.track:") && uid.ends_with(".*") {
        let offset: u32 = params.get("offset").and_then(|s| s.parse().ok()).unwrap_or(0);
        let limit: u32 = params.get("limit").and_then(|s| s.parse().ok()).unwrap_or(25);

        let posts = if uid.contains(".2013.") {
            vec![track_json(&state, 2013, 445898, "Song_Title", "/assets/tracks/445898/song.mp3")]
        } else if uid.contains(".2014.") {
            vec![track_json(&state, 2014, 600001, "GoneSong", "/assets/forbidden.mp3")]
        } else if uid.contains(".2015.") {
            vec![
                track_json(&state, 2015, 555001, "SongOne", "/assets/tracks/555001/song.mp3"),
                track_json(&state, 2015, 555002, "SongTwo", "/assets/tracks/555002/song.mp3"),
            ]
        } else {
            Vec::new()
        };

        return Json(serde_json::json!({
            "posts": posts,
            "pagination": { "offset": offset, "limit": limit, "last_page": true }
        }))
        .into_response();
    }

    if uid.starts_with("post.artist:") {
        state.counters.artist_fetches.fetch_add(1, Ordering::SeqCst);
        // The 2013 artist is gone from the catalog.
        if uid == "post.artist:apdm.bandwagon.oa$445898" {
            return StatusCode::NOT_FOUND.into_response();
        }
        return Json(serde_json::json!({
            "post": {
                "uid": uid,
                "document": {
                    "name": "Band",
                    "members": [ { "name": "A" }, { "name": "B" } ]
                }
            }
        }))
        .into_response();
    }

    StatusCode::NOT_FOUND.into_response()
}

async fn identities_handler(
    State(state): State<Arc<StubState>>,
    AxumPath(id): AxumPath<u64>,
) -> axum::response::Response {
    state.counters.identity_fetches.fetch_add(1, Ordering::SeqCst);
    if id == 42 {
        Json(serde_json::json!({ "profile": { "name": "Uploader Person" } })).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn publications_handler(
    State(state): State<Arc<StubState>>,
    AxumPath(_label): AxumPath<String>,
) -> StatusCode {
    state.counters.publication_fetches.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}

async fn asset_handler(
    State(state): State<Arc<StubState>>,
    AxumPath(oid): AxumPath<u32>,
) -> String {
    state.counters.downloads.fetch_add(1, Ordering::SeqCst);
    format!("audio-bytes-{}", oid)
}

struct TestRun {
    out_dir: TempDir,
    cache_dir: TempDir,
    base_url: String,
}

impl TestRun {
    fn new(base_url: String) -> Self {
        Self {
            out_dir: TempDir::new().unwrap(),
            cache_dir: TempDir::new().unwrap(),
            base_url,
        }
    }

    /// Run the pipeline with a fresh client, as a separate invocation would.
    async fn run(&self, years: &[u16]) -> RunSummary {
        let gateway = Arc::new(GroveClient::new(&self.base_url, 10).unwrap());
        let materializer = Materializer::new(10).unwrap();
        let settings = PipelineSettings {
            cache_dir: self.cache_dir.path().to_path_buf(),
            out_dir: self.out_dir.path().to_path_buf(),
            page_limit: 25,
            max_pages: None,
            in_flight: 4,
        };
        ExportPipeline::new(gateway, materializer, settings)
            .run(years)
            .await
            .unwrap()
    }

    fn output_file(&self, year: u16, name: &str) -> std::path::PathBuf {
        self.out_dir.path().join(year.to_string()).join(name)
    }
}

#[tokio::test]
async fn test_unknown_artist_scenario() {
    let (base_url, _counters) = spawn_stub_server().await;
    let run = TestRun::new(base_url);

    let summary = run.run(&[2013]).await;

    assert_eq!(summary.counts(2013).completed, 1);
    assert_eq!(summary.counts(2013).failed, 0);

    // Placeholder artist and the underscore in the track name are both
    // sanitized into the archive filename.
    let asset = run.output_file(2013, "unknown_Song-Title_DIS_Amedia___R01.mp3");
    assert_eq!(std::fs::read(&asset).unwrap(), b"audio-bytes-445898");

    let xml = std::fs::read_to_string(
        run.output_file(2013, "unknown_Song-Title_DIS_Amedia___R01.xml"),
    )
    .unwrap();
    assert!(xml.contains("<SongTitle>Song_Title</SongTitle>"));
    assert!(xml.contains("<Artist>(unknown)</Artist>"));
    // Publication lookup failed, so Source is the title-cased label.
    assert!(xml.contains("<Source>Oa</Source>"));
    assert!(xml.contains("<Rightsholder>Uploader Person</Rightsholder>"));
}

#[tokio::test]
async fn test_forbidden_asset_is_dropped_silently() {
    let (base_url, counters) = spawn_stub_server().await;
    let run = TestRun::new(base_url);

    let summary = run.run(&[2014]).await;

    assert_eq!(summary.counts(2014).completed, 0);
    assert_eq!(summary.counts(2014).skipped, 1);
    assert_eq!(summary.counts(2014).failed, 0);
    assert!(!summary.has_failures());

    // Nothing was written for the dropped record.
    let year_dir = run.out_dir.path().join("2014");
    let entries: Vec<_> = std::fs::read_dir(&year_dir)
        .map(|dir| dir.collect::<Result<Vec<_>, _>>().unwrap())
        .unwrap_or_default();
    assert!(entries.is_empty());
    assert_eq!(counters.downloads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shared_entities_are_fetched_once() {
    let (base_url, counters) = spawn_stub_server().await;
    let run = TestRun::new(base_url);

    let summary = run.run(&[2015]).await;
    assert_eq!(summary.counts(2015).completed, 2);

    // Both tracks were uploaded by identity 42 and share the publication
    // label; the memoized client fetched each exactly once.
    assert_eq!(counters.identity_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(counters.publication_fetches.load(Ordering::SeqCst), 1);

    let one = run.output_file(2015, "Band_SongOne_DIS_Amedia___R01.mp3");
    let two = run.output_file(2015, "Band_SongTwo_DIS_Amedia___R01.mp3");
    assert_eq!(std::fs::read(&one).unwrap(), b"audio-bytes-555001");
    assert_eq!(std::fs::read(&two).unwrap(), b"audio-bytes-555002");

    let xml = std::fs::read_to_string(
        run.output_file(2015, "Band_SongOne_DIS_Amedia___R01.xml"),
    )
    .unwrap();
    assert!(xml.contains("<Performers>A;B</Performers>"));
    assert!(xml.contains("<Project>Bandwagon 2015</Project>"));
}

#[tokio::test]
async fn test_second_run_reuses_cache_and_rewrites_identical_output() {
    let (base_url, counters) = spawn_stub_server().await;
    let run = TestRun::new(base_url);

    run.run(&[2015]).await;
    assert_eq!(counters.downloads.load(Ordering::SeqCst), 2);

    let asset_path = run.output_file(2015, "Band_SongOne_DIS_Amedia___R01.mp3");
    let xml_path = run.output_file(2015, "Band_SongOne_DIS_Amedia___R01.xml");
    let first_asset = std::fs::read(&asset_path).unwrap();
    let first_xml = std::fs::read(&xml_path).unwrap();

    let summary = run.run(&[2015]).await;

    // No new downloads; outputs rewritten byte-identically.
    assert_eq!(counters.downloads.load(Ordering::SeqCst), 2);
    assert_eq!(summary.counts(2015).completed, 2);
    assert_eq!(std::fs::read(&asset_path).unwrap(), first_asset);
    assert_eq!(std::fs::read(&xml_path).unwrap(), first_xml);
}

#[tokio::test]
async fn test_empty_partition_completes_with_zero_counts() {
    let (base_url, _counters) = spawn_stub_server().await;
    let run = TestRun::new(base_url);

    let summary = run.run(&[1999]).await;

    assert_eq!(summary.counts(1999).completed, 0);
    assert!(!summary.has_failures());
}
