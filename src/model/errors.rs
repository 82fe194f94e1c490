//! Model validation errors

use thiserror::Error;

/// Result type for model parsing
pub type ModelResult<T> = Result<T, ModelError>;

/// Rejected identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("group id must not be empty")]
    EmptyGroupId,

    #[error("role name must not be empty")]
    EmptyRoleName,

    #[error("role name must be a single word: {0:?}")]
    InvalidRoleName(String),

    #[error("member name must not be empty")]
    EmptyMember,

    #[error("member name must not contain whitespace: {0:?}")]
    InvalidMember(String),

    #[error("member name must not start with another mention prefix: {0:?}")]
    RepeatedPrefix(String),
}

impl ModelError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::EmptyGroupId => "ROLECALL_MODEL_EMPTY_GROUP",
            ModelError::EmptyRoleName => "ROLECALL_MODEL_EMPTY_ROLE",
            ModelError::InvalidRoleName(_) => "ROLECALL_MODEL_INVALID_ROLE",
            ModelError::EmptyMember => "ROLECALL_MODEL_EMPTY_MEMBER",
            ModelError::InvalidMember(_) => "ROLECALL_MODEL_INVALID_MEMBER",
            ModelError::RepeatedPrefix(_) => "ROLECALL_MODEL_REPEATED_PREFIX",
        }
    }
}
