//! Background replication worker
//!
//! Commits publish into a watch channel; the worker pushes whatever is
//! newest when it wakes. Snapshots published while a push is in flight
//! collapse into one follow-up push of the latest state.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::sink::{ReplicationOutcome, ReplicationSink};
use crate::model::Snapshot;
use crate::observability::{Event, Logger, MetricsRegistry};

/// Publishing side, held by the registry
#[derive(Debug, Clone)]
pub struct ReplicationHandle {
    tx: Arc<watch::Sender<Option<Arc<Snapshot>>>>,
}

impl ReplicationHandle {
    /// Hand a committed snapshot to the worker. Never blocks.
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }
}

pub struct ReplicationWorker;

impl ReplicationWorker {
    /// Start the worker. It stops once every handle is dropped, after
    /// pushing whatever was last published.
    pub fn spawn(
        sink: Arc<ReplicationSink>,
        metrics: Arc<MetricsRegistry>,
    ) -> (ReplicationHandle, JoinHandle<()>) {
        let (tx, mut rx) = watch::channel::<Option<Arc<Snapshot>>>(None);

        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let latest = rx.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    let outcome = sink.push(&snapshot).await;
                    report(&outcome, &metrics);
                }
            }
            Logger::info(Event::ReplicationWorkerStopped, &[]);
        });

        (ReplicationHandle { tx: Arc::new(tx) }, task)
    }
}

fn report(outcome: &ReplicationOutcome, metrics: &MetricsRegistry) {
    match outcome {
        ReplicationOutcome::Replicated { version } => {
            metrics.increment_replicated();
            Logger::info(Event::Replicated, &[("version", version.as_str())]);
        }
        ReplicationOutcome::Skipped(reason) => {
            metrics.increment_replication_skipped();
            Logger::trace(Event::ReplicationSkipped, &[("reason", reason.as_str())]);
        }
        ReplicationOutcome::Failed(err) => {
            metrics.increment_replication_failed();
            let detail = err.to_string();
            Logger::warn(
                Event::ReplicationFailed,
                &[("code", err.code()), ("error", detail.as_str())],
            );
        }
    }
}
