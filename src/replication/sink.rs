//! Replication sink
//!
//! Pushes a committed snapshot to the remote, best effort:
//! - No remote configured → `Skipped(NotConfigured)`
//! - Same bytes as the last accepted push → `Skipped(Unchanged)`
//! - Otherwise fetch the current version and put conditionally on it
//!
//! A push never touches the local registry state. Failures are returned as
//! `Failed` for the caller to log; the next commit pushes the whole snapshot
//! again, so nothing is lost by dropping one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sha2::{Digest, Sha256};

use super::errors::{ReplicationError, ReplicationResult};
use super::remote::{RemoteContent, RemoteVersion};
use crate::codec;
use crate::model::Snapshot;

/// Default bound on one push (fetch and put together)
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotConfigured,
    Unchanged,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotConfigured => "not_configured",
            SkipReason::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationOutcome {
    Replicated { version: RemoteVersion },
    Skipped(SkipReason),
    Failed(ReplicationError),
}

#[derive(Debug)]
pub struct ReplicationSink {
    remote: Option<Arc<dyn RemoteContent>>,
    timeout: Duration,
    /// Digest of the last snapshot the remote accepted
    last_digest: Mutex<Option<[u8; 32]>>,
}

impl ReplicationSink {
    pub fn disabled() -> Self {
        Self {
            remote: None,
            timeout: DEFAULT_PUSH_TIMEOUT,
            last_digest: Mutex::new(None),
        }
    }

    pub fn new(remote: Arc<dyn RemoteContent>, timeout: Duration) -> Self {
        Self {
            remote: Some(remote),
            timeout,
            last_digest: Mutex::new(None),
        }
    }

    pub fn target(&self) -> Option<String> {
        self.remote.as_ref().map(|r| r.describe())
    }

    pub async fn push(&self, snapshot: &Snapshot) -> ReplicationOutcome {
        let remote = match &self.remote {
            Some(remote) => remote,
            None => return ReplicationOutcome::Skipped(SkipReason::NotConfigured),
        };

        let bytes = codec::encode(snapshot);
        let digest: [u8; 32] = Sha256::digest(&bytes).into();
        if *self.last_digest() == Some(digest) {
            return ReplicationOutcome::Skipped(SkipReason::Unchanged);
        }

        let pushed = tokio::time::timeout(self.timeout, Self::fetch_and_put(remote.as_ref(), &bytes))
            .await
            .unwrap_or_else(|_| Err(ReplicationError::Timeout(self.timeout.as_millis() as u64)));

        match pushed {
            Ok(version) => {
                *self.last_digest() = Some(digest);
                ReplicationOutcome::Replicated { version }
            }
            Err(err) => ReplicationOutcome::Failed(err),
        }
    }

    async fn fetch_and_put(
        remote: &dyn RemoteContent,
        bytes: &[u8],
    ) -> ReplicationResult<RemoteVersion> {
        let current = remote.fetch().await?;
        match current {
            Some(doc) if doc.content == bytes => Ok(doc.version),
            Some(doc) => remote.put(bytes, Some(&doc.version)).await,
            None => remote.put(bytes, None).await,
        }
    }

    fn last_digest(&self) -> std::sync::MutexGuard<'_, Option<[u8; 32]>> {
        self.last_digest.lock().unwrap_or_else(|e| e.into_inner())
    }
}
