//! In-memory remote with conditional writes and fault injection

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::errors::{ReplicationError, ReplicationResult};
use super::remote::{RemoteContent, RemoteDocument, RemoteVersion};

#[derive(Debug, Default)]
struct RemoteState {
    document: Option<RemoteDocument>,
    revision: u64,
    fail_with: Option<ReplicationError>,
    pending_edit: Option<Vec<u8>>,
}

impl RemoteState {
    fn write(&mut self, content: Vec<u8>) -> RemoteVersion {
        self.revision += 1;
        let version = RemoteVersion::new(format!("rev-{}", self.revision));
        self.document = Some(RemoteDocument {
            content,
            version: version.clone(),
        });
        version
    }
}

#[derive(Debug, Default)]
pub struct MemoryRemote {
    state: Mutex<RemoteState>,
    puts: AtomicU64,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing document.
    pub fn with_content(content: impl Into<Vec<u8>>) -> Self {
        let remote = Self::new();
        remote.external_edit(content);
        remote
    }

    /// Fail every call with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<ReplicationError>) {
        self.lock().fail_with = error;
    }

    /// Someone else writes the document right now.
    pub fn external_edit(&self, content: impl Into<Vec<u8>>) {
        self.lock().write(content.into());
    }

    /// Someone else writes the document between our next fetch and put.
    pub fn edit_before_next_put(&self, content: impl Into<Vec<u8>>) {
        self.lock().pending_edit = Some(content.into());
    }

    pub fn content(&self) -> Option<Vec<u8>> {
        self.lock().document.as_ref().map(|d| d.content.clone())
    }

    pub fn version(&self) -> Option<RemoteVersion> {
        self.lock().document.as_ref().map(|d| d.version.clone())
    }

    /// Number of accepted puts
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RemoteContent for MemoryRemote {
    async fn fetch(&self) -> ReplicationResult<Option<RemoteDocument>> {
        let state = self.lock();
        if let Some(err) = &state.fail_with {
            return Err(err.clone());
        }
        Ok(state.document.clone())
    }

    async fn put(
        &self,
        content: &[u8],
        expected: Option<&RemoteVersion>,
    ) -> ReplicationResult<RemoteVersion> {
        let mut state = self.lock();
        if let Some(err) = &state.fail_with {
            return Err(err.clone());
        }
        if let Some(edit) = state.pending_edit.take() {
            state.write(edit);
        }

        let current = state.document.as_ref().map(|d| &d.version);
        if current != expected {
            return Err(ReplicationError::Conflict(format!(
                "expected {:?}, remote at {:?}",
                expected.map(RemoteVersion::as_str),
                current.map(RemoteVersion::as_str),
            )));
        }

        let version = state.write(content.to_vec());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
