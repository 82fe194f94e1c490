//! CLI command implementations
//!
//! # Serve sequence
//!
//! 1. Configuration load (file, `.env`, environment)
//! 2. Snapshot load under the corruption policy
//! 3. Replication worker start (when configured)
//! 4. HTTP surface start (when configured)
//! 5. Serving loop: one spawned handler per stdin line
//! 6. On EOF: drain handlers, stop HTTP, let replication push the last
//!    committed snapshot, exit

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::auth::StaticAuthorizer;
use crate::codec;
use crate::command::CommandFacade;
use crate::config::Config;
use crate::http_server::HttpServer;
use crate::model::GroupId;
use crate::observability::{route_all_to_stderr, set_min_severity, Event, Logger, MetricsRegistry};
use crate::registry::{RegistryOptions, RoleRegistry};
use crate::replication::{GitHubContents, RemoteContent, ReplicationSink, ReplicationWorker};
use crate::store::{FileSnapshotStore, SnapshotStore};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::handle_line;

/// Responses waiting for the stdout writer
const RESPONSE_BUFFER: usize = 256;

/// Main CLI entry point
///
/// Loads `.env`, parses arguments and dispatches. This is the only
/// function that main.rs should call.
pub fn run() -> CliResult<()> {
    let _ = dotenvy::dotenv();
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command on a fresh multi-threaded runtime
pub fn run_command(cmd: Command) -> CliResult<()> {
    // stdout carries command output and the serve response stream
    route_all_to_stderr(true);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    runtime.block_on(async move {
        match cmd {
            Command::Serve { config } => serve(config.as_deref()).await,
            Command::Inspect { config, group } => {
                inspect(config.as_deref(), group.as_deref()).await
            }
            Command::Check { config } => check(config.as_deref()).await,
            Command::Pull { config, force } => pull(config.as_deref(), force).await,
        }
    })
}

fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let config = Config::load(path)?;
    set_min_severity(config.severity());

    let data_path = config.data_path.display().to_string();
    let replication = match &config.replication {
        Some(r) => format!("{}:{}@{}", r.repository, r.path, r.branch),
        None => "disabled".to_string(),
    };
    Logger::info(
        Event::ConfigLoaded,
        &[
            ("data_path", data_path.as_str()),
            ("replication", replication.as_str()),
        ],
    );
    Ok(config)
}

fn open_store(config: &Config) -> FileSnapshotStore {
    FileSnapshotStore::new(&config.data_path).with_save_timeout(config.store_timeout())
}

fn write_stdout(value: &serde_json::Value) -> CliResult<()> {
    use std::io::Write;

    let mut stdout = std::io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Open the registry and serve chat commands from stdin until EOF.
pub async fn serve(config_path: Option<&Path>) -> CliResult<()> {
    Logger::info(Event::BootStart, &[]);
    let config = load_config(config_path)?;
    let metrics = Arc::new(MetricsRegistry::new());

    let store: Arc<dyn SnapshotStore> = Arc::new(open_store(&config));
    let options = RegistryOptions {
        tolerate_corrupt: config.tolerate_corrupt_snapshot,
    };
    let mut registry = RoleRegistry::open(store, options)
        .await?
        .with_metrics(Arc::clone(&metrics));

    let location = registry.store_location();
    let mut replication_target = String::from("disabled");

    let replication_worker = match &config.replication {
        Some(replication) => {
            let remote = GitHubContents::new(replication)?;
            let sink = ReplicationSink::new(Arc::new(remote), replication.timeout());
            if let Some(target) = sink.target() {
                replication_target = target;
            }
            let (handle, worker) = ReplicationWorker::spawn(Arc::new(sink), Arc::clone(&metrics));
            registry = registry.with_replication(handle);
            Some(worker)
        }
        None => {
            Logger::info(Event::ReplicationDisabled, &[]);
            None
        }
    };

    let (http_stop, http_task) = match config.http.clone() {
        Some(http) => {
            let (stop_tx, stop_rx) = oneshot::channel::<()>();
            let server = HttpServer::new(http, registry.clone());
            let task = tokio::spawn(server.start(async move {
                let _ = stop_rx.await;
            }));
            (Some(stop_tx), Some(task))
        }
        None => (None, None),
    };

    let authorizer = StaticAuthorizer::from_lists(&config.global_admins, &config.admins);
    let mut facade = CommandFacade::new(registry, Arc::new(authorizer));
    if let Some(name) = &config.bot_name {
        facade = facade.with_bot_name(name.clone());
    }

    Logger::info(
        Event::Serving,
        &[
            ("surface", "stdin"),
            ("location", location.as_str()),
            ("replication", replication_target.as_str()),
        ],
    );
    serve_lines(&facade, tokio::io::stdin(), tokio::io::stdout()).await?;

    Logger::info(Event::ShutdownStart, &[]);
    if let Some(stop) = http_stop {
        let _ = stop.send(());
    }
    if let Some(task) = http_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(CliError::boot_failed(format!("HTTP server failed: {}", e))),
            Err(e) => return Err(CliError::boot_failed(format!("HTTP server task failed: {}", e))),
        }
    }

    // The last registry handle goes with the facade; the worker then
    // pushes whatever was last committed and stops.
    drop(facade);
    if let Some(worker) = replication_worker {
        let _ = worker.await;
    }

    let counters = metrics.to_json().to_string();
    Logger::info(Event::ShutdownComplete, &[("metrics", counters.as_str())]);
    Ok(())
}

/// Serving loop over any line source and sink.
///
/// Each line is handled in its own task. Returns once input is exhausted
/// and every response has been written.
pub(crate) async fn serve_lines<R, W>(facade: &CommandFacade, input: R, output: W) -> CliResult<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(RESPONSE_BUFFER);
    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(line) = rx.recv().await {
            output.write_all(line.as_bytes()).await?;
            output.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let mut handlers = JoinSet::new();
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let facade = facade.clone();
        let tx = tx.clone();
        handlers.spawn(async move {
            let response = handle_line(&facade, &line).await;
            let _ = tx.send(response.to_line()).await;
        });
    }

    while handlers.join_next().await.is_some() {}
    drop(tx);

    writer
        .await
        .map_err(|e| CliError::io_error(format!("response writer failed: {}", e)))??;
    Ok(())
}

/// Print the stored snapshot, or one group's roles.
pub async fn inspect(config_path: Option<&Path>, group: Option<&str>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let snapshot = open_store(&config).load().await?;

    let output = match group {
        Some(group) => {
            let group = GroupId::parse(group)
                .map_err(|e| CliError::config_error(format!("--group: {}", e)))?;
            let roles: Vec<_> = snapshot
                .list_roles(&group)
                .into_iter()
                .map(|(role, members)| json!({"role": role, "members": members}))
                .collect();
            json!({"group": group, "roles": roles})
        }
        None => serde_json::from_slice(&codec::encode(&snapshot))?,
    };
    write_stdout(&output)
}

/// Verify the stored snapshot decodes.
pub async fn check(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config);
    let snapshot = store.load().await?;
    write_stdout(&json!({
        "status": "ok",
        "location": store.location(),
        "groups": snapshot.group_count(),
        "roles": snapshot.role_count(),
    }))
}

/// Replace the local snapshot with the remote copy.
///
/// Refuses to overwrite a local snapshot that has roles unless `force`.
/// A corrupt local snapshot counts as non-empty.
pub async fn pull(config_path: Option<&Path>, force: bool) -> CliResult<()> {
    let config = load_config(config_path)?;
    let replication = config
        .replication
        .as_ref()
        .ok_or_else(|| CliError::config_error("replication is not configured"))?;

    let remote = GitHubContents::new(replication)?;
    let document = remote
        .fetch()
        .await?
        .ok_or_else(|| CliError::remote_failed(format!("{} has no snapshot", remote.describe())))?;
    let snapshot = codec::decode(&document.content)?;

    let store = open_store(&config);
    if !force {
        let local_has_data = match store.load().await {
            Ok(local) => !local.is_empty(),
            Err(e) if e.is_corrupt() => true,
            Err(e) => return Err(e.into()),
        };
        if local_has_data {
            return Err(CliError::local_not_empty(&store.location()));
        }
    }
    store.save(&snapshot).await?;

    let groups = snapshot.group_count().to_string();
    Logger::info(
        Event::RemotePulled,
        &[
            ("groups", groups.as_str()),
            ("version", document.version.as_str()),
        ],
    );
    write_stdout(&json!({
        "status": "ok",
        "version": document.version.as_str(),
        "groups": snapshot.group_count(),
        "roles": snapshot.role_count(),
    }))
}
