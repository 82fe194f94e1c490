//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit.

use std::fmt;
use std::io;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::replication::ReplicationError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or environment error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Registry could not be opened
    BootFailed,
    /// Stored snapshot does not decode
    SnapshotCorrupt,
    /// Remote copy could not be read or decoded
    RemoteFailed,
    /// Local snapshot has data and `--force` was not given
    LocalNotEmpty,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ROLECALL_CLI_CONFIG_ERROR",
            Self::IoError => "ROLECALL_CLI_IO_ERROR",
            Self::BootFailed => "ROLECALL_CLI_BOOT_FAILED",
            Self::SnapshotCorrupt => "ROLECALL_CLI_SNAPSHOT_CORRUPT",
            Self::RemoteFailed => "ROLECALL_CLI_REMOTE_FAILED",
            Self::LocalNotEmpty => "ROLECALL_CLI_LOCAL_NOT_EMPTY",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn remote_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::RemoteFailed, msg)
    }

    pub fn local_not_empty(location: &str) -> Self {
        Self::new(
            CliErrorCode::LocalNotEmpty,
            format!(
                "Local snapshot at {} already has roles. Re-run with --force to overwrite.",
                location
            ),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(format!("{} ({})", e, e.code()))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        let code = if e.is_corrupt() {
            CliErrorCode::SnapshotCorrupt
        } else {
            CliErrorCode::BootFailed
        };
        Self::new(code, format!("{} ({})", e, e.code()))
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Store(store) => store.into(),
            other => Self::boot_failed(format!("{} ({})", other, other.code())),
        }
    }
}

impl From<ReplicationError> for CliError {
    fn from(e: ReplicationError) -> Self {
        Self::remote_failed(format!("{} ({})", e, e.code()))
    }
}

impl From<CodecError> for CliError {
    fn from(e: CodecError) -> Self {
        Self::remote_failed(format!("remote snapshot does not decode: {} ({})", e, e.code()))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
