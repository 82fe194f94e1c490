//! Snapshot decode errors

use thiserror::Error;

use crate::model::ModelError;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Persisted bytes could not be turned into a snapshot.
///
/// Decoding never yields a partially populated snapshot: any of these
/// errors means nothing was produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Not JSON, truncated, or not the group/role/member nesting
    #[error("malformed snapshot: {0}")]
    Malformed(String),

    /// Well-formed JSON carrying an identifier the model rejects
    #[error("invalid entry in group {group:?}: {source}")]
    InvalidEntry {
        group: String,
        #[source]
        source: ModelError,
    },
}

impl CodecError {
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::Malformed(_) => "ROLECALL_DECODE_MALFORMED",
            CodecError::InvalidEntry { .. } => "ROLECALL_DECODE_INVALID_ENTRY",
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Malformed(e.to_string())
    }
}
