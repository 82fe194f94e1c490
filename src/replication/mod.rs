//! Replication to a remote authoritative copy
//!
//! - Best effort: the local commit is authoritative, replication never
//!   unwinds it
//! - Full-state pushes: every push carries the whole snapshot, so a failed
//!   push is repaired by the next one
//! - Optimistic concurrency: a push is conditioned on the remote version
//!   read just before it, and a concurrent external edit fails the push
//!   instead of being overwritten
//! - Disabled by default: without a remote every push is `Skipped`
//!
//! The registry never awaits a push. It publishes committed snapshots to a
//! `ReplicationWorker`, which pushes the newest one in the background.

mod config;
mod errors;
mod github;
mod memory;
mod remote;
mod sink;
mod worker;

pub use config::ReplicationConfig;
pub use errors::{ReplicationError, ReplicationResult};
pub use github::GitHubContents;
pub use memory::MemoryRemote;
pub use remote::{RemoteContent, RemoteDocument, RemoteVersion};
pub use sink::{ReplicationOutcome, ReplicationSink, SkipReason, DEFAULT_PUSH_TIMEOUT};
pub use worker::{ReplicationHandle, ReplicationWorker};
