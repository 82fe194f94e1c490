//! Durable store errors
//!
//! Error codes:
//! - ROLECALL_STORE_IO: read, write, fsync, rename or timeout failure
//! - ROLECALL_STORE_CORRUPT: stored bytes do not decode

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::codec::CodecError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation did not complete; a failed save left the previous
    /// snapshot in place.
    #[error("snapshot I/O failed at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },

    /// A snapshot exists but cannot be decoded.
    #[error("snapshot at {location} is corrupt: {source}")]
    Corrupt {
        location: String,
        #[source]
        source: CodecError,
    },
}

impl StoreError {
    pub fn io(location: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            location: location.into(),
            source,
        }
    }

    pub fn corrupt(location: impl Into<String>, source: CodecError) -> Self {
        StoreError::Corrupt {
            location: location.into(),
            source,
        }
    }

    /// An I/O error of kind `TimedOut`
    pub fn timed_out(location: impl Into<String>, after: Duration) -> Self {
        Self::io(
            location,
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("save did not finish within {}ms", after.as_millis()),
            ),
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io { .. } => "ROLECALL_STORE_IO",
            StoreError::Corrupt { .. } => "ROLECALL_STORE_CORRUPT",
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == io::ErrorKind::TimedOut)
    }
}
