//! In-memory snapshot store with fault injection
//!
//! Stores the encoded bytes so corruption can be simulated at the byte
//! level, the same way a damaged file would look.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::{StoreError, StoreResult};
use super::SnapshotStore;
use crate::codec;
use crate::model::Snapshot;

const LOCATION: &str = "memory";

#[derive(Debug)]
pub struct MemorySnapshotStore {
    bytes: Mutex<Option<Vec<u8>>>,
    fail_saves: AtomicBool,
    saves: AtomicU64,
    save_delay: Duration,
    save_timeout: Duration,
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self {
            bytes: Mutex::new(None),
            fail_saves: AtomicBool::new(false),
            saves: AtomicU64::new(0),
            save_delay: Duration::ZERO,
            save_timeout: super::DEFAULT_SAVE_TIMEOUT,
        }
    }
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw stored bytes, valid or not.
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
            ..Self::default()
        }
    }

    /// Start with an encoded snapshot.
    pub fn with_snapshot(snapshot: &Snapshot) -> Self {
        Self::with_bytes(codec::encode(snapshot))
    }

    /// Delay every save; a delay beyond the timeout fails the save without
    /// storing anything.
    pub fn with_save_delay(mut self, delay: Duration, timeout: Duration) -> Self {
        self.save_delay = delay;
        self.save_timeout = timeout;
        self
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of saves that stored a snapshot
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Decode whatever is currently stored.
    pub fn stored(&self) -> StoreResult<Snapshot> {
        let bytes = self.bytes.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match bytes {
            Some(bytes) => codec::decode(&bytes).map_err(|e| StoreError::corrupt(LOCATION, e)),
            None => Ok(Snapshot::new()),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> StoreResult<Snapshot> {
        self.stored()
    }

    async fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        if !self.save_delay.is_zero() {
            if self.save_delay > self.save_timeout {
                tokio::time::sleep(self.save_timeout).await;
                return Err(StoreError::timed_out(LOCATION, self.save_timeout));
            }
            tokio::time::sleep(self.save_delay).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::io(
                LOCATION,
                io::Error::new(io::ErrorKind::Other, "injected save failure"),
            ));
        }
        let encoded = codec::encode(snapshot);
        *self.bytes.lock().unwrap_or_else(|e| e.into_inner()) = Some(encoded);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        LOCATION.to_string()
    }
}
