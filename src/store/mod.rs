//! Durable snapshot store
//!
//! Holds exactly one encoded snapshot at a fixed location.
//!
//! # Guarantees
//!
//! - `load` on a missing location yields the empty snapshot
//! - `load` on undecodable bytes yields `StoreError::Corrupt`
//! - `save` is atomic: readers and crash recovery see either the previous
//!   snapshot or the new one, never a mix
//! - `save` is bounded: implementations doing external I/O enforce their own
//!   timeout and report it as `StoreError::Io`
//! - a failed `save` never publishes the new snapshot later

mod errors;
mod file;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use file::{FileSnapshotStore, DEFAULT_SAVE_TIMEOUT};
pub use memory::MemorySnapshotStore;

use std::fmt;

use async_trait::async_trait;

use crate::model::Snapshot;

#[async_trait]
pub trait SnapshotStore: Send + Sync + fmt::Debug {
    /// Load the stored snapshot, or the empty snapshot if none exists.
    async fn load(&self) -> StoreResult<Snapshot>;

    /// Atomically replace the stored snapshot.
    async fn save(&self, snapshot: &Snapshot) -> StoreResult<()>;

    /// Human-readable location for logs and errors
    fn location(&self) -> String;
}
