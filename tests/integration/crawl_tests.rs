//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the Data API and run full
//! sessions through the real HTTP client, checkpoint and record stream.

use comment_harvest::checkpoint::{CheckpointStore, JsonCheckpointStore};
use comment_harvest::client::PageToken;
use comment_harvest::config::{
    ApiConfig, ChannelConfig, CheckpointBackend, Config, CrawlerConfig, DataPaths, OutputConfig,
    QuotaConfig,
};
use comment_harvest::crawler::{
    register_uploads, resolve_channel, CommentHarvester, CrawlDriver, SessionContext,
    StopReason, StopSignal,
};
use comment_harvest::quota::QuotaBudget;
use comment_harvest::sink::{load_sink_stats, NdjsonSink};
use comment_harvest::YouTubeClient;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/youtube/v3";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, data_dir: &str) -> Config {
    Config {
        channel: ChannelConfig {
            handle: Some("testchannel".to_string()),
            id: None,
        },
        api: ApiConfig {
            base_url: format!("{}{}", base_url, API_PATH),
            api_key_env: "COMMENT_HARVEST_TEST_KEY".to_string(),
            request_delay_ms: 0,
            timeout_secs: 5,
        },
        quota: QuotaConfig {
            session_units: 100,
            diagnostic_units: 10,
        },
        crawler: CrawlerConfig::default(),
        output: OutputConfig {
            data_dir: data_dir.to_string(),
            checkpoint_backend: CheckpointBackend::Json,
        },
    }
}

fn comment_json(id: &str, parent_id: Option<&str>) -> Value {
    let mut snippet = json!({
        "channelId": "UCtestchannel",
        "videoId": "ignored",
        "textDisplay": format!("text of {}", id),
        "authorDisplayName": "@viewer",
        "authorChannelId": {"value": "UCviewer"},
        "likeCount": 1,
        "publishedAt": "2024-01-01T00:00:00Z"
    });
    if let Some(parent_id) = parent_id {
        snippet["parentId"] = json!(parent_id);
    }
    json!({"id": id, "snippet": snippet})
}

fn thread_json(id: &str, total_reply_count: u64, embedded: &[&str]) -> Value {
    let mut thread = json!({
        "id": id,
        "snippet": {
            "totalReplyCount": total_reply_count,
            "topLevelComment": comment_json(id, None)
        }
    });
    if !embedded.is_empty() {
        let replies: Vec<Value> = embedded
            .iter()
            .map(|reply| comment_json(reply, Some(id)))
            .collect();
        thread["replies"] = json!({ "comments": replies });
    }
    thread
}

fn page_json(items: Vec<Value>, next: Option<&str>) -> Value {
    let mut page = json!({ "items": items });
    if let Some(next) = next {
        page["nextPageToken"] = json!(next);
    }
    page
}

fn quota_exceeded_body() -> Value {
    json!({"error": {"code": 403, "message": "quota", "errors": [
        {"message": "quota", "domain": "youtube.quota", "reason": "quotaExceeded"}
    ]}})
}

/// Mounts a thread page; pages with a token must be mounted before the first page
async fn mount_threads(
    server: &MockServer,
    video_id: &str,
    token: Option<&str>,
    response: ResponseTemplate,
) {
    let mock = Mock::given(method("GET"))
        .and(path(format!("{}/commentThreads", API_PATH)))
        .and(query_param("videoId", video_id))
        .and(query_param("key", "test-key"));
    let mock = match token {
        Some(token) => mock.and(query_param("pageToken", token)),
        None => mock,
    };
    mock.respond_with(response).mount(server).await;
}

/// Mounts the standard two-video fixture
///
/// v1: two thread pages, the first holding a thread whose replies need a
/// separate walk. v2: a single page with inlined replies.
async fn mount_channel(server: &MockServer) {
    mount_threads(
        server,
        "v1",
        Some("T2"),
        ResponseTemplate::new(200).set_body_json(page_json(
            vec![thread_json("c3", 0, &[]), thread_json("c4", 0, &[])],
            None,
        )),
    )
    .await;
    mount_threads(
        server,
        "v1",
        None,
        ResponseTemplate::new(200).set_body_json(page_json(
            vec![thread_json("c1", 7, &["c1.a"]), thread_json("c2", 1, &["c2.a"])],
            Some("T2"),
        )),
    )
    .await;

    let replies: Vec<Value> = (0..7)
        .map(|i| comment_json(&format!("c1.r{}", i), Some("c1")))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("{}/comments", API_PATH)))
        .and(query_param("parentId", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(replies, None)))
        .mount(server)
        .await;

    mount_threads(
        server,
        "v2",
        None,
        ResponseTemplate::new(200).set_body_json(page_json(
            vec![thread_json("d1", 2, &["d1.a", "d1.b"])],
            None,
        )),
    )
    .await;
}

fn session(
    config: &Config,
    paths: &DataPaths,
    store: JsonCheckpointStore,
    units: u64,
) -> CrawlDriver<YouTubeClient, NdjsonSink, JsonCheckpointStore> {
    let client = YouTubeClient::new(&config.api, &config.crawler, "test-key")
        .expect("Failed to build client");
    let sink = NdjsonSink::open(&paths.comments_path()).expect("Failed to open sink");
    let harvester = CommentHarvester::new(client, sink, QuotaBudget::new(units), StopSignal::new())
        .with_reply_threshold(config.crawler.reply_threshold);
    CrawlDriver::new(
        SessionContext::new(config.channel.label()),
        harvester,
        store,
        config.crawler.report_every,
    )
}

fn open_store(config: &Config, paths: &DataPaths, videos: &[&str]) -> JsonCheckpointStore {
    let mut store =
        JsonCheckpointStore::open(&paths.checkpoint_path(config.output.checkpoint_backend))
            .expect("Failed to open checkpoint");
    for video in videos {
        store.register_video(video).expect("Failed to register");
    }
    store
}

#[tokio::test]
async fn test_full_session_harvests_every_comment() {
    let mock_server = MockServer::start().await;
    mount_channel(&mock_server).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path().to_str().unwrap());
    let paths = DataPaths::from_config(&config);
    paths.ensure_dirs().unwrap();

    let store = open_store(&config, &paths, &["v1", "v2"]);
    let mut driver = session(&config, &paths, store, 100);
    let summary = driver.run().await.expect("Session failed");

    assert_eq!(summary.stop_reason, StopReason::AllVideosDone);
    assert_eq!(summary.videos_completed, 2);
    assert_eq!(summary.top_level_comments, 5);
    // c1 via its own walk (7), c2 inlined (1), d1 inlined (2)
    assert_eq!(summary.replies, 10);
    // v1: 2 thread pages + 1 reply page, v2: 1 thread page
    assert_eq!(summary.units_used, 4);
    drop(driver);

    let stats = load_sink_stats(&paths.list_comment_files().unwrap()).unwrap();
    assert_eq!(stats.total, 15);
    assert_eq!(stats.duplicates(), 0);
    assert_eq!(stats.replies, 10);

    let reloaded =
        JsonCheckpointStore::open(&paths.checkpoint_path(CheckpointBackend::Json)).unwrap();
    assert!(reloaded.videos().unwrap().iter().all(|v| v.done));
}

#[tokio::test]
async fn test_quota_exhaustion_then_resume() {
    let mock_server = MockServer::start().await;
    mount_threads(
        &mock_server,
        "v1",
        Some("T2"),
        ResponseTemplate::new(403).set_body_json(quota_exceeded_body()),
    )
    .await;
    mount_threads(
        &mock_server,
        "v1",
        None,
        ResponseTemplate::new(200).set_body_json(page_json(
            vec![thread_json("c1", 0, &[]), thread_json("c2", 0, &[])],
            Some("T2"),
        )),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path().to_str().unwrap());
    let paths = DataPaths::from_config(&config);
    let checkpoint_path = paths.checkpoint_path(CheckpointBackend::Json);

    let store = open_store(&config, &paths, &["v1", "v2"]);
    let mut driver = session(&config, &paths, store, 100);
    let summary = driver.run().await.expect("Session failed");

    assert_eq!(summary.stop_reason, StopReason::QuotaExhausted);
    assert_eq!(summary.videos_processed, 1);
    assert!(driver.harvester().budget().is_exhausted());
    drop(driver);

    let reloaded = JsonCheckpointStore::open(&checkpoint_path).unwrap();
    let videos = reloaded.videos().unwrap();
    assert!(!videos[0].done);
    assert_eq!(videos[0].resume_cursor, Some(PageToken::new("T2")));
    assert!(!videos[1].is_half_way());

    // Next day: quota restored
    mock_server.reset().await;
    mount_channel(&mock_server).await;

    let mut driver = session(&config, &paths, reloaded, 100);
    let summary = driver.run().await.expect("Session failed");
    assert_eq!(summary.stop_reason, StopReason::AllVideosDone);
    // T2 of v1 (2 comments) and all of v2 (1 comment, 2 replies)
    assert_eq!(summary.top_level_comments, 3);
    assert_eq!(summary.units_used, 2);

    let stats = load_sink_stats(&paths.list_comment_files().unwrap()).unwrap();
    assert_eq!(stats.total, 7);
    assert_eq!(stats.duplicates(), 0);
}

#[tokio::test]
async fn test_diagnostic_budget_limits_session() {
    let mock_server = MockServer::start().await;
    mount_channel(&mock_server).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path().to_str().unwrap());
    let paths = DataPaths::from_config(&config);

    let store = open_store(&config, &paths, &["v1", "v2"]);
    let mut driver = session(&config, &paths, store, 2);
    let summary = driver.run().await.expect("Session failed");

    assert_eq!(summary.stop_reason, StopReason::BudgetDepleted);
    assert_eq!(summary.units_used, 2);
    assert_eq!(summary.videos_completed, 0);

    // The reply walk for c1 ended exactly at the bound, so page 1 is kept
    let videos = driver.store().videos().unwrap();
    assert_eq!(videos[0].resume_cursor, Some(PageToken::new("T2")));
    assert!(!videos[1].is_half_way());
}

#[tokio::test]
async fn test_discovery_registers_uploads() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/channels", API_PATH)))
        .and(query_param("forHandle", "@testchannel"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"items": [{"id": "UCtestchannel"}]})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/channels", API_PATH)))
        .and(query_param("id", "UCtestchannel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [{
            "id": "UCtestchannel",
            "contentDetails": {"relatedPlaylists": {"uploads": "UUtestchannel"}}
        }]})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/playlistItems", API_PATH)))
        .and(query_param("pageToken", "P2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![json!({"contentDetails": {"videoId": "v3"}})],
            None,
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/playlistItems", API_PATH)))
        .and(query_param("playlistId", "UUtestchannel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![
                json!({"contentDetails": {"videoId": "v1"}}),
                json!({"contentDetails": {"videoId": "v2"}}),
            ],
            Some("P2"),
        )))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path().to_str().unwrap());
    let paths = DataPaths::from_config(&config);
    let client = YouTubeClient::new(&config.api, &config.crawler, "test-key").unwrap();
    let budget = QuotaBudget::new(10);
    let mut store = open_store(&config, &paths, &[]);

    let channel_id = resolve_channel(&client, &budget, &config.channel)
        .await
        .expect("Failed to resolve channel");
    assert_eq!(channel_id, "UCtestchannel");

    let report = register_uploads(&client, &mut store, &budget, &StopSignal::new(), &channel_id)
        .await
        .expect("Discovery failed");
    assert_eq!(report.found, 3);
    assert_eq!(report.registered, 3);
    assert!(report.complete);
    // handle + uploads + 2 item pages
    assert_eq!(budget.remaining().units(), 6);

    let pending: Vec<_> = store
        .pending_videos()
        .unwrap()
        .into_iter()
        .map(|v| v.video_id)
        .collect();
    assert_eq!(pending, vec!["v1", "v2", "v3"]);
}
