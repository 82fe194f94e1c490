//! Replication error types
//!
//! None of these are fatal: they are reported as
//! `ReplicationOutcome::Failed` and logged.

use thiserror::Error;

/// Result type for replication operations
pub type ReplicationResult<T> = Result<T, ReplicationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// Transport failure: DNS, connect, reset
    #[error("remote unreachable: {0}")]
    Network(String),

    /// Credentials missing, expired or lacking permission
    #[error("remote rejected credentials: {0}")]
    Auth(String),

    /// Remote moved since its version was read
    #[error("remote copy changed concurrently: {0}")]
    Conflict(String),

    #[error("replication timed out after {0}ms")]
    Timeout(u64),

    /// Remote answered, but not in the expected shape
    #[error("unexpected remote response: {0}")]
    Protocol(String),

    #[error("invalid replication configuration: {0}")]
    Configuration(String),
}

impl ReplicationError {
    pub fn code(&self) -> &'static str {
        match self {
            ReplicationError::Network(_) => "ROLECALL_REPLICATION_NETWORK",
            ReplicationError::Auth(_) => "ROLECALL_REPLICATION_AUTH",
            ReplicationError::Conflict(_) => "ROLECALL_REPLICATION_CONFLICT",
            ReplicationError::Timeout(_) => "ROLECALL_REPLICATION_TIMEOUT",
            ReplicationError::Protocol(_) => "ROLECALL_REPLICATION_PROTOCOL",
            ReplicationError::Configuration(_) => "ROLECALL_REPLICATION_CONFIG",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ReplicationError::Conflict(_))
    }
}
