//! Registry error types
//!
//! `RoleNotFound` is not here: it is an ordinary outcome
//! (see `RemoveOutcome`, `DeleteOutcome`).

use thiserror::Error;

use crate::model::ModelError;
use crate::store::StoreError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("at least one member is required")]
    EmptyMemberSet,

    #[error("invalid input: {0}")]
    InvalidInput(#[from] ModelError),

    /// Save or load failed; a failed mutation changed nothing
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The commit task died before reporting
    #[error("registry commit aborted: {0}")]
    Internal(String),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::EmptyMemberSet => "ROLECALL_REGISTRY_EMPTY_MEMBER_SET",
            RegistryError::InvalidInput(e) => e.code(),
            RegistryError::Store(e) => e.code(),
            RegistryError::Internal(_) => "ROLECALL_REGISTRY_INTERNAL",
        }
    }

    /// Caller error, as opposed to a storage or internal failure
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            RegistryError::EmptyMemberSet | RegistryError::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through() {
        let err: RegistryError = ModelError::EmptyRoleName.into();
        assert_eq!(err.code(), "ROLECALL_MODEL_EMPTY_ROLE");
        assert!(err.is_invalid_input());
        assert!(!RegistryError::Internal("panic".into()).is_invalid_input());
    }
}
