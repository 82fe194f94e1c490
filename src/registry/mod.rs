//! Role registry
//!
//! The single source of truth for role membership.
//!
//! # Commit protocol
//!
//! 1. Acquire the registry lock (FIFO, one mutation at a time)
//! 2. Apply the operation to a copy of the snapshot
//! 3. If nothing changed, stop: no save, no replication
//! 4. Save the copy through the durable store (bounded by the store timeout)
//! 5. Swap the copy in and publish it to replication
//! 6. Release the lock
//!
//! A failed save leaves the in-memory state exactly as it was. Steps 2-6
//! run in their own task, so a caller that gives up after the lock is
//! acquired cannot interrupt commit-or-rollback.

mod errors;
mod outcome;
mod registry;

pub use errors::{RegistryError, RegistryResult};
pub use outcome::{DeleteOutcome, RemoveOutcome};
pub use registry::{RegistryOptions, RoleRegistry};
