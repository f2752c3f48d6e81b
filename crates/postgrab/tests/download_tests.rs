//! Image downloads against scripted post pages and a mock image origin.

mod common;

use common::{count_calls, image, ScriptedNavigator, ScriptedPage};
use postgrab::acquisition::HttpClient;
use postgrab::config::{DownloadConfig, ManifestPaths, ProfileFile, Timings};
use postgrab::download::{self, EntryState, ImageOutcome};
use postgrab::error::ManifestError;
use postgrab::manifest::Manifest;
use postgrab::progress::ProgressEmitter;
use postgrab::session::DownloadSession;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post_url(volume: u32) -> String {
    format!("https://m.post.naver.com/viewer/postView.naver?volumeNo={volume}")
}

fn config(output_dir: &Path, indexed: bool) -> DownloadConfig {
    let profile = ProfileFile {
        timings: Timings::immediate(),
        ..ProfileFile::default()
    };
    DownloadConfig::new(profile, indexed, output_dir)
}

fn session(nav: ScriptedNavigator) -> DownloadSession {
    DownloadSession::with_navigator(Box::new(nav), HttpClient::new(5_000).unwrap())
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Three content images and two avatar/icon images on one post.
async fn gallery(server: &MockServer) -> ScriptedPage {
    serve(server, "/post-phinf/one.jpg", 200, b"one").await;
    serve(server, "/post-phinf/two.jpg", 200, b"two").await;
    serve(server, "/post-phinf/three.jpg", 200, b"three").await;
    serve(server, "/static/avatar.png", 200, b"avatar").await;
    serve(server, "/static/icon.png", 200, b"icon").await;

    let base = server.uri();
    ScriptedPage::new(vec![
        image(&format!("{base}/static/avatar.png")),
        image(&format!("{base}/post-phinf/one.jpg")),
        image(&format!("{base}/post-phinf/two.jpg")),
        image(&format!("{base}/static/icon.png")),
        image(&format!("{base}/post-phinf/three.jpg")),
    ])
}

fn one_post() -> Manifest {
    Manifest::new(vec![post_url(1)], vec!["Gallery".to_string()]).unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn only_content_images_are_fetched() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let nav = ScriptedNavigator::new().page(&post_url(1), gallery(&server).await);
    let mut session = session(nav);

    let report = download::download_all(
        &mut session,
        &one_post(),
        &config(out.path(), false),
        &mut ProgressEmitter::disabled(),
    )
    .await;
    session.close().await.unwrap();

    assert_eq!(request_count(&server).await, 3);
    assert_eq!(report.downloaded(), 3);
    let folder = out.path().join("Gallery");
    assert_eq!(std::fs::read(folder.join("one.jpg")).unwrap(), b"one");
    assert_eq!(std::fs::read(folder.join("two.jpg")).unwrap(), b"two");
    assert_eq!(std::fs::read(folder.join("three.jpg")).unwrap(), b"three");
    assert!(!folder.join("avatar.png").exists());
    assert!(!folder.join("icon.png").exists());
    assert_eq!(report.entries[0].reached, EntryState::Done);
}

#[tokio::test]
async fn existing_file_is_skipped() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let folder = out.path().join("Gallery");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("two.jpg"), b"already here").unwrap();

    let nav = ScriptedNavigator::new().page(&post_url(1), gallery(&server).await);
    let mut session = session(nav);
    let report = download::download_all(
        &mut session,
        &one_post(),
        &config(out.path(), false),
        &mut ProgressEmitter::disabled(),
    )
    .await;

    assert_eq!(report.downloaded(), 2);
    assert_eq!(report.skipped(), 1);
    assert_eq!(request_count(&server).await, 2);
    assert_eq!(std::fs::read(folder.join("two.jpg")).unwrap(), b"already here");
}

#[tokio::test]
async fn failed_image_does_not_stop_the_post() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post-phinf/one.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&server)
        .await;
    let page = gallery(&server).await;
    let out = tempfile::tempdir().unwrap();

    let nav = ScriptedNavigator::new().page(&post_url(1), page);
    let mut session = session(nav);
    let report = download::download_all(
        &mut session,
        &one_post(),
        &config(out.path(), false),
        &mut ProgressEmitter::disabled(),
    )
    .await;

    let folder = out.path().join("Gallery");
    assert_eq!(report.failed(), 1);
    assert_eq!(report.downloaded(), 2);
    assert!(!folder.join("one.jpg").exists());
    assert!(!folder.join("one.jpg.part").exists());
    assert!(folder.join("two.jpg").exists());
    assert!(folder.join("three.jpg").exists());
}

#[tokio::test]
async fn second_run_writes_and_requests_nothing() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let page = gallery(&server).await;
    let config = config(out.path(), true);

    let nav = ScriptedNavigator::new().page(&post_url(1), page.clone());
    let mut first = session(nav);
    let report = download::download_all(
        &mut first,
        &one_post(),
        &config,
        &mut ProgressEmitter::disabled(),
    )
    .await;
    first.close().await.unwrap();
    assert_eq!(report.downloaded(), 3);
    let requests_after_first = request_count(&server).await;

    let nav = ScriptedNavigator::new().page(&post_url(1), page);
    let mut second = session(nav);
    let report = download::download_all(
        &mut second,
        &one_post(),
        &config,
        &mut ProgressEmitter::disabled(),
    )
    .await;
    second.close().await.unwrap();

    assert_eq!(report.downloaded(), 0);
    assert_eq!(report.skipped(), 3);
    assert_eq!(request_count(&server).await, requests_after_first);
}

#[tokio::test]
async fn indexed_folders_carry_the_ordinal() {
    let server = MockServer::start().await;
    serve(&server, "/post-phinf/seven.jpg", 200, b"7").await;
    let out = tempfile::tempdir().unwrap();

    let mut nav = ScriptedNavigator::new();
    let mut urls = Vec::new();
    let mut titles = Vec::new();
    for volume in 1..=7 {
        let page = if volume == 7 {
            ScriptedPage::new(vec![image(&format!("{}/post-phinf/seven.jpg", server.uri()))])
        } else {
            ScriptedPage::new(vec![])
        };
        nav = nav.page(&post_url(volume), page);
        urls.push(post_url(volume));
        titles.push(format!("Post {volume}"));
    }
    let manifest = Manifest::new(urls, titles).unwrap();

    let mut session = session(nav);
    let report = download::download_all(
        &mut session,
        &manifest,
        &config(out.path(), true),
        &mut ProgressEmitter::disabled(),
    )
    .await;

    assert!(out.path().join("007 - Post 7").join("seven.jpg").exists());
    assert!(out.path().join("001 - Post 1").is_dir());
    // Posts without images still finish.
    assert!(report.entries.iter().all(|e| e.reached == EntryState::Done));
    assert_eq!(report.entries[0].images(), 0);
}

#[tokio::test]
async fn unreachable_post_does_not_abort_the_batch() {
    let server = MockServer::start().await;
    let page = gallery(&server).await;
    let out = tempfile::tempdir().unwrap();
    let nav = ScriptedNavigator::new()
        .fail_navigation(&post_url(1))
        .page(&post_url(2), page);
    let log = nav.log();

    let manifest = Manifest::new(
        vec![post_url(1), post_url(2)],
        vec!["Broken".to_string(), "Gallery".to_string()],
    )
    .unwrap();
    let mut session = session(nav);
    let report = download::download_all(
        &mut session,
        &manifest,
        &config(out.path(), false),
        &mut ProgressEmitter::disabled(),
    )
    .await;
    session.close().await.unwrap();

    let broken = &report.entries[0];
    assert_eq!(broken.reached, EntryState::FolderReady);
    assert!(broken.error.is_some());
    assert_eq!(report.abandoned().count(), 1);
    assert_eq!(report.entries[1].reached, EntryState::Done);
    assert_eq!(report.downloaded(), 3);
    assert_eq!(count_calls(&log, "navigate"), 2);
    assert_eq!(count_calls(&log, "close"), 1);
}

#[tokio::test]
async fn shared_titles_share_a_folder() {
    let server = MockServer::start().await;
    serve(&server, "/a/post-phinf/cover.jpg", 200, b"first").await;
    serve(&server, "/b/post-phinf/cover.jpg", 200, b"second").await;
    let base = server.uri();
    let out = tempfile::tempdir().unwrap();

    let nav = ScriptedNavigator::new()
        .page(
            &post_url(1),
            ScriptedPage::new(vec![image(&format!("{base}/a/post-phinf/cover.jpg"))]),
        )
        .page(
            &post_url(2),
            ScriptedPage::new(vec![image(&format!("{base}/b/post-phinf/cover.jpg"))]),
        );
    let manifest = Manifest::new(
        vec![post_url(1), post_url(2)],
        vec!["Same".to_string(), "Same".to_string()],
    )
    .unwrap();

    let mut session = session(nav);
    let report = download::download_all(
        &mut session,
        &manifest,
        &config(out.path(), false),
        &mut ProgressEmitter::disabled(),
    )
    .await;

    // The file name is the only identity: the second post's cover is skipped.
    assert_eq!(report.downloaded(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(
        std::fs::read(out.path().join("Same").join("cover.jpg")).unwrap(),
        b"first"
    );
}

#[tokio::test]
async fn mismatched_manifest_stops_before_any_download() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    let paths = ManifestPaths {
        urls: dir.path().join("urls.txt"),
        titles: dir.path().join("titles.txt"),
    };
    std::fs::write(&paths.urls, format!("{}\n{}\n", post_url(1), post_url(2))).unwrap();
    std::fs::write(&paths.titles, "Only one title\n").unwrap();

    assert!(matches!(
        Manifest::load(&paths),
        Err(ManifestError::CardinalityMismatch { urls: 2, titles: 1 })
    ));

    let err = postgrab::cli::download_cmd::run(Some("y"), &out, &paths, None)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("2 urls but 1 titles"));
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_manifest_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ManifestPaths {
        urls: dir.path().join("urls.txt"),
        titles: dir.path().join("titles.txt"),
    };
    std::fs::write(&paths.titles, "Title\n").unwrap();

    assert!(matches!(
        Manifest::load(&paths),
        Err(ManifestError::Missing(p)) if p == paths.urls
    ));
}

#[test]
fn image_outcomes_serialize_in_snake_case() {
    assert_eq!(
        serde_json::to_string(&ImageOutcome::Downloaded).unwrap(),
        "\"downloaded\""
    );
}

#[tokio::test]
async fn very_long_title_still_gets_a_folder() {
    let server = MockServer::start().await;
    let page = gallery(&server).await;
    let out = tempfile::tempdir().unwrap();
    let nav = ScriptedNavigator::new().page(&post_url(1), page);
    let manifest = Manifest::new(vec![post_url(1)], vec!["제주도 여행".repeat(20)]).unwrap();

    let mut session = session(nav);
    let report = download::download_all(
        &mut session,
        &manifest,
        &config(out.path(), true),
        &mut ProgressEmitter::disabled(),
    )
    .await;

    let entry = &report.entries[0];
    assert_eq!(entry.reached, EntryState::Done, "{:?}", entry.error);
    assert_eq!(report.downloaded(), 3);
    let folder = entry.folder.as_deref().unwrap();
    assert!(folder.starts_with("001 - 제주도 여행"));
    assert!(out.path().join(folder).join("one.jpg").exists());
}
