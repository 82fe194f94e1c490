//! File-backed snapshot store
//!
//! Atomic replace via:
//! 1. Write encoded snapshot to a unique temp file in the target directory
//! 2. fsync temp file
//! 3. Rename temp over target (atomic on POSIX)
//! 4. fsync the directory so the rename itself is durable
//!
//! A crash before step 3 leaves the previous snapshot untouched. A stray
//! temp file is harmless and never read.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::SnapshotStore;
use crate::codec;
use crate::model::Snapshot;
use crate::observability::{Event, Logger};

/// Default bound on a single save
pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
    save_timeout: Duration,
}

/// Handshake between a save call and its blocking writer.
///
/// Whoever takes the lock first decides: either the writer publishes
/// (rename) before the caller gives up, or the caller abandons and the
/// writer discards its temp file.
#[derive(Debug, Default)]
struct Publication {
    abandoned: bool,
    published: bool,
}

impl FileSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            save_timeout: DEFAULT_SAVE_TIMEOUT,
        }
    }

    pub fn with_save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout = timeout;
        self
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
    }

    fn read_blocking(path: &Path) -> StoreResult<Snapshot> {
        let location = path.display().to_string();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::new()),
            Err(e) => return Err(StoreError::io(location, e)),
        };
        codec::decode(&bytes).map_err(|e| StoreError::corrupt(location, e))
    }

    fn write_blocking(
        path: &Path,
        temp_path: &Path,
        bytes: &[u8],
        publication: &Mutex<Publication>,
    ) -> StoreResult<()> {
        let location = path.display().to_string();
        let io_err = |e: io::Error| StoreError::io(location.clone(), e);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .map_err(io_err)?;
        let written = file.write_all(bytes).and_then(|_| file.sync_all());
        drop(file);
        if let Err(e) = written {
            let _ = fs::remove_file(temp_path);
            return Err(io_err(e));
        }

        {
            let mut state = publication.lock().unwrap_or_else(|e| e.into_inner());
            if state.abandoned {
                let _ = fs::remove_file(temp_path);
                return Err(io_err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "save abandoned before publish",
                )));
            }
            if let Err(e) = fs::rename(temp_path, path) {
                let _ = fs::remove_file(temp_path);
                return Err(io_err(e));
            }
            state.published = true;
        }

        // Best effort: the rename is already visible to readers
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> StoreResult<Snapshot> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::read_blocking(&path))
            .await
            .map_err(|e| StoreError::io(self.location(), io::Error::new(io::ErrorKind::Other, e)))?
    }

    async fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let bytes = codec::encode(snapshot);
        let size = bytes.len().to_string();
        let location = self.location();
        let result = self.publish(bytes).await;
        match &result {
            Ok(()) => Logger::trace(
                Event::SnapshotSaved,
                &[("bytes", size.as_str()), ("location", location.as_str())],
            ),
            Err(err) => {
                let detail = err.to_string();
                Logger::warn(
                    Event::SnapshotSaveFailed,
                    &[
                        ("code", err.code()),
                        ("error", detail.as_str()),
                        ("location", location.as_str()),
                    ],
                );
            }
        }
        result
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

impl FileSnapshotStore {
    /// Write, then rename unless the timeout fired first.
    async fn publish(&self, bytes: Vec<u8>) -> StoreResult<()> {
        let publication = Arc::new(Mutex::new(Publication::default()));

        let path = self.path.clone();
        let temp_path = self.temp_path();
        let writer_publication = Arc::clone(&publication);
        let writer = tokio::task::spawn_blocking(move || {
            Self::write_blocking(&path, &temp_path, &bytes, &writer_publication)
        });

        match tokio::time::timeout(self.save_timeout, writer).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(StoreError::io(
                self.location(),
                io::Error::new(io::ErrorKind::Other, join_err),
            )),
            Err(_) => {
                let mut state = publication.lock().unwrap_or_else(|e| e.into_inner());
                if state.published {
                    // Lost the race with our own timeout: the write landed.
                    return Ok(());
                }
                state.abandoned = true;
                Err(StoreError::timed_out(self.location(), self.save_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupId, Member, RoleName};
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        let mut snap = Snapshot::new();
        snap.add_members(
            &GroupId::parse("g1").unwrap(),
            &RoleName::parse("eng").unwrap(),
            vec![Member::parse("alice").unwrap(), Member::parse("bob").unwrap()],
        );
        snap
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("roles.json"));
        assert_eq!(store.load().await.unwrap(), Snapshot::new());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested/roles.json"));
        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("roles.json"));
        store.save(&sample()).await.unwrap();
        store.save(&Snapshot::new()).await.unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["roles.json".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, b"{\"g1\": {\"eng\": [\"ali").unwrap();
        let err = FileSnapshotStore::new(&path).load().await.unwrap_err();
        assert!(err.is_corrupt());
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, b"").unwrap();
        assert!(FileSnapshotStore::new(&path).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_into_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is expected
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let store = FileSnapshotStore::new(blocker.join("roles.json"));
        let err = store.save(&sample()).await.unwrap_err();
        assert_eq!(err.code(), "ROLECALL_STORE_IO");
    }

    #[test]
    fn test_abandoned_write_is_never_published() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");
        let temp = dir.path().join(".roles.json.test.tmp");
        let publication = Mutex::new(Publication {
            abandoned: true,
            published: false,
        });

        let result = FileSnapshotStore::write_blocking(&path, &temp, b"{}", &publication);
        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!temp.exists());
    }
}
