//! Configuration errors

use std::io;

use thiserror::Error;

use crate::replication::ReplicationError;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Replication(#[from] ReplicationError),
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "ROLECALL_CONFIG_READ",
            ConfigError::Parse { .. } => "ROLECALL_CONFIG_PARSE",
            ConfigError::InvalidValue { .. } => "ROLECALL_CONFIG_INVALID",
            ConfigError::Replication(e) => e.code(),
        }
    }
}
