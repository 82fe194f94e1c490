//! Replication Tests
//!
//! - The GitHub contents client against a local fake of the contents API
//!   (base64 bodies, blob SHAs, conditional writes, bearer auth)
//! - The background worker end to end: committed state reaches the remote,
//!   remote failures never touch local state

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use rolecall::codec;
use rolecall::model::{GroupId, Member, RoleName, Snapshot};
use rolecall::observability::MetricsRegistry;
use rolecall::registry::{RegistryOptions, RoleRegistry};
use rolecall::replication::{
    GitHubContents, MemoryRemote, RemoteContent, ReplicationConfig, ReplicationError,
    ReplicationOutcome, ReplicationSink, ReplicationWorker, SkipReason,
};
use rolecall::store::MemorySnapshotStore;

// =============================================================================
// Fake Contents API
// =============================================================================

const TOKEN: &str = "test-token";
const CONTENTS_PATH: &str = "/repos/acme/roles/contents/data/roles.json";

#[derive(Debug, Default)]
struct FakeRepo {
    content: Option<Vec<u8>>,
    sha: Option<String>,
    writes: u64,
    /// Move the blob before the next PUT is checked
    race_next_put: bool,
    /// Delay every GET
    stall: Option<Duration>,
}

impl FakeRepo {
    fn store(&mut self, content: Vec<u8>) -> String {
        self.writes += 1;
        let sha = format!("blob{}", self.writes);
        self.content = Some(content);
        self.sha = Some(sha.clone());
        sha
    }
}

type Shared = Arc<Mutex<FakeRepo>>;

#[derive(Debug, Deserialize)]
struct RefQuery {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutBody {
    message: String,
    content: String,
    branch: String,
    sha: Option<String>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", TOKEN))
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn get_contents(
    State(repo): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<RefQuery>,
) -> Response {
    if !authorized(&headers) {
        return failure(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    let stall = repo.lock().unwrap().stall;
    if let Some(stall) = stall {
        tokio::time::sleep(stall).await;
    }
    if query.reference.as_deref() != Some("main") {
        return failure(StatusCode::NOT_FOUND, "No commit found for the ref");
    }

    let repo = repo.lock().unwrap();
    match (&repo.content, &repo.sha) {
        (Some(content), Some(sha)) => {
            // The real API wraps base64 at 60 columns
            let encoded = STANDARD.encode(content);
            let wrapped: Vec<String> = encoded
                .as_bytes()
                .chunks(60)
                .map(|c| String::from_utf8_lossy(c).into_owned())
                .collect();
            Json(json!({
                "sha": sha,
                "encoding": "base64",
                "content": wrapped.join("\n"),
            }))
            .into_response()
        }
        _ => failure(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn put_contents(
    State(repo): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<PutBody>,
) -> Response {
    if !authorized(&headers) {
        return failure(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    assert!(!body.message.is_empty());
    assert_eq!(body.branch, "main");

    let mut repo = repo.lock().unwrap();
    if repo.race_next_put {
        repo.race_next_put = false;
        repo.store(b"{\"other\": {\"writer\": [\"x\"]}}".to_vec());
    }
    match (&repo.sha, &body.sha) {
        (Some(current), Some(given)) if current != given => {
            return failure(StatusCode::CONFLICT, "does not match");
        }
        (Some(_), None) => {
            return failure(StatusCode::UNPROCESSABLE_ENTITY, "\"sha\" wasn't supplied");
        }
        (None, Some(_)) => return failure(StatusCode::CONFLICT, "file does not exist"),
        _ => {}
    }

    let content = match STANDARD.decode(&body.content) {
        Ok(content) => content,
        Err(_) => return failure(StatusCode::BAD_REQUEST, "content is not valid Base64"),
    };
    let sha = repo.store(content);
    (StatusCode::OK, Json(json!({ "content": { "sha": sha } }))).into_response()
}

async fn start_fake() -> (String, Shared) {
    let repo: Shared = Arc::new(Mutex::new(FakeRepo::default()));
    let app = Router::new()
        .route(CONTENTS_PATH, get(get_contents).put(put_contents))
        .with_state(repo.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), repo)
}

fn config_for(api_base: &str) -> ReplicationConfig {
    let mut config = ReplicationConfig::new("acme/roles");
    config.api_base = api_base.to_string();
    config.path = "/data/roles.json".to_string();
    config.token = Some(TOKEN.to_string());
    config.timeout_ms = 2_000;
    config
}

fn snapshot_with(entries: &[(&str, &str, &str)]) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for (group, role, member) in entries {
        snapshot.add_members(
            &GroupId::parse(group).unwrap(),
            &RoleName::parse(role).unwrap(),
            vec![Member::parse(member).unwrap()],
        );
    }
    snapshot
}

fn github_sink(api_base: &str) -> ReplicationSink {
    let remote = GitHubContents::new(&config_for(api_base)).unwrap();
    ReplicationSink::new(Arc::new(remote), Duration::from_secs(2))
}

// =============================================================================
// Contents API Client
// =============================================================================

#[tokio::test]
async fn test_first_push_creates_then_updates() {
    let (api, repo) = start_fake().await;
    let sink = github_sink(&api);

    let first = snapshot_with(&[("g", "eng", "alice")]);
    match sink.push(&first).await {
        ReplicationOutcome::Replicated { version } => assert_eq!(version.as_str(), "blob1"),
        other => panic!("unexpected outcome {:?}", other),
    }

    let second = snapshot_with(&[("g", "eng", "alice"), ("g", "ops", "bob")]);
    match sink.push(&second).await {
        ReplicationOutcome::Replicated { version } => assert_eq!(version.as_str(), "blob2"),
        other => panic!("unexpected outcome {:?}", other),
    }

    let stored = repo.lock().unwrap().content.clone().unwrap();
    assert_eq!(codec::decode(&stored).unwrap(), second);
}

#[tokio::test]
async fn test_fetch_reads_wrapped_base64() {
    let (api, repo) = start_fake().await;
    let remote = GitHubContents::new(&config_for(&api)).unwrap();
    assert!(remote.fetch().await.unwrap().is_none());

    // Long enough to wrap over several lines
    let snapshot = snapshot_with(&[
        ("-1001", "backend", "alice"),
        ("-1001", "frontend", "bob"),
        ("-1002", "oncall", "carol"),
    ]);
    repo.lock().unwrap().store(codec::encode(&snapshot));

    let document = remote.fetch().await.unwrap().unwrap();
    assert_eq!(document.version.as_str(), "blob1");
    assert_eq!(codec::decode(&document.content).unwrap(), snapshot);
}

#[tokio::test]
async fn test_unchanged_snapshot_is_not_pushed_again() {
    let (api, repo) = start_fake().await;
    let sink = github_sink(&api);
    let snapshot = snapshot_with(&[("g", "eng", "alice")]);

    assert!(matches!(
        sink.push(&snapshot).await,
        ReplicationOutcome::Replicated { .. }
    ));
    assert_eq!(
        sink.push(&snapshot).await,
        ReplicationOutcome::Skipped(SkipReason::Unchanged)
    );
    assert_eq!(repo.lock().unwrap().writes, 1);
}

#[tokio::test]
async fn test_remote_edit_is_replaced_by_local_state() {
    let (api, repo) = start_fake().await;
    let sink = github_sink(&api);

    repo.lock().unwrap().store(b"{\"stale\": {\"copy\": [\"x\"]}}".to_vec());
    let snapshot = snapshot_with(&[("g", "eng", "alice")]);
    assert!(matches!(
        sink.push(&snapshot).await,
        ReplicationOutcome::Replicated { .. }
    ));

    let stored = repo.lock().unwrap().content.clone().unwrap();
    assert_eq!(codec::decode(&stored).unwrap(), snapshot);
}

#[tokio::test]
async fn test_concurrent_remote_write_is_a_conflict() {
    let (api, repo) = start_fake().await;
    let sink = github_sink(&api);
    repo.lock().unwrap().store(b"{}".to_vec());
    repo.lock().unwrap().race_next_put = true;

    match sink.push(&snapshot_with(&[("g", "eng", "alice")])).await {
        ReplicationOutcome::Failed(err) => assert!(err.is_conflict()),
        other => panic!("unexpected outcome {:?}", other),
    }
    // The other writer's content stays
    let stored = repo.lock().unwrap().content.clone().unwrap();
    assert_eq!(stored, b"{\"other\": {\"writer\": [\"x\"]}}".to_vec());
}

#[tokio::test]
async fn test_bad_token_is_an_auth_failure() {
    let (api, _repo) = start_fake().await;
    let mut config = config_for(&api);
    config.token = Some("wrong".to_string());
    let remote = GitHubContents::new(&config).unwrap();

    let err = remote.fetch().await.unwrap_err();
    assert!(matches!(err, ReplicationError::Auth(_)));
    assert_eq!(err.code(), "ROLECALL_REPLICATION_AUTH");
}

#[tokio::test]
async fn test_slow_remote_times_out() {
    let (api, repo) = start_fake().await;
    repo.lock().unwrap().stall = Some(Duration::from_millis(500));
    let remote = GitHubContents::new(&config_for(&api)).unwrap();
    let sink = ReplicationSink::new(Arc::new(remote), Duration::from_millis(50));

    match sink.push(&snapshot_with(&[("g", "eng", "alice")])).await {
        ReplicationOutcome::Failed(ReplicationError::Timeout(ms)) => assert_eq!(ms, 50),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(repo.lock().unwrap().writes, 0);
}

// =============================================================================
// Worker
// =============================================================================

async fn wait_for<F: Fn() -> bool>(condition: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 5s");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_committed_state_reaches_remote() {
    let remote = Arc::new(MemoryRemote::new());
    let metrics = Arc::new(MetricsRegistry::new());
    let sink = ReplicationSink::new(remote.clone(), Duration::from_secs(1));
    let (handle, worker) = ReplicationWorker::spawn(Arc::new(sink), metrics.clone());

    let registry = RoleRegistry::open(
        Arc::new(MemorySnapshotStore::new()),
        RegistryOptions::default(),
    )
    .await
    .unwrap()
    .with_metrics(metrics.clone())
    .with_replication(handle);

    let g = GroupId::parse("g").unwrap();
    for who in ["alice", "bob", "carol"] {
        registry
            .add_members(&g, &RoleName::parse("eng").unwrap(), vec![Member::parse(who).unwrap()])
            .await
            .unwrap();
    }
    let committed = registry.snapshot().await;

    // Dropping the last handle flushes the latest snapshot, then stops
    drop(registry);
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .unwrap()
        .unwrap();

    let pushed = codec::decode(&remote.content().unwrap()).unwrap();
    assert_eq!(pushed, committed);
    assert!(metrics.snapshot().replicated >= 1);
}

#[tokio::test]
async fn test_remote_outage_never_blocks_commits() {
    let remote = Arc::new(MemoryRemote::new());
    remote.fail_with(Some(ReplicationError::Network("connection refused".into())));
    let metrics = Arc::new(MetricsRegistry::new());
    let sink = ReplicationSink::new(remote.clone(), Duration::from_secs(1));
    let (handle, _worker) = ReplicationWorker::spawn(Arc::new(sink), metrics.clone());

    let store = Arc::new(MemorySnapshotStore::new());
    let registry = RoleRegistry::open(store.clone(), RegistryOptions::default())
        .await
        .unwrap()
        .with_replication(handle);

    let g = GroupId::parse("g").unwrap();
    let r = RoleName::parse("eng").unwrap();
    registry
        .add_members(&g, &r, vec![Member::parse("alice").unwrap()])
        .await
        .unwrap();
    wait_for(|| metrics.snapshot().replication_failed >= 1).await;

    assert_eq!(store.save_count(), 1);
    assert!(remote.content().is_none());

    // Recovery: the next commit carries the full state
    remote.fail_with(None);
    registry
        .add_members(&g, &r, vec![Member::parse("bob").unwrap()])
        .await
        .unwrap();
    wait_for(|| remote.content().is_some()).await;
    let pushed = codec::decode(&remote.content().unwrap()).unwrap();
    assert_eq!(pushed, registry.snapshot().await);
}
