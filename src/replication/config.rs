//! Replication configuration
//!
//! Absent section = replication disabled. The credential comes from the
//! environment and is never serialized or printed.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{ReplicationError, ReplicationResult};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// API root (default: "https://api.github.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Target repository as "owner/name"
    pub repository: String,

    /// File path inside the repository (default: "roles.json")
    #[serde(default = "default_path")]
    pub path: String,

    /// Branch to write to (default: "main")
    #[serde(default = "default_branch")]
    pub branch: String,

    /// API token
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Bound on one push, fetch and put together (default: 10s)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Commit message for each replicated snapshot
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_path() -> String {
    "roles.json".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_commit_message() -> String {
    "Update role registry snapshot".to_string()
}

impl ReplicationConfig {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            api_base: default_api_base(),
            repository: repository.into(),
            path: default_path(),
            branch: default_branch(),
            token: None,
            timeout_ms: default_timeout_ms(),
            commit_message: default_commit_message(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> ReplicationResult<()> {
        let mut parts = self.repository.split('/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if owner.is_empty() || name.is_empty() || parts.next().is_some() {
            return Err(ReplicationError::Configuration(format!(
                "repository must be 'owner/name', got '{}'",
                self.repository
            )));
        }
        if self.path.trim_matches('/').is_empty() {
            return Err(ReplicationError::Configuration(
                "path must not be empty".to_string(),
            ));
        }
        if self.branch.is_empty() {
            return Err(ReplicationError::Configuration(
                "branch must not be empty".to_string(),
            ));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ReplicationError::Configuration(format!(
                "api_base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ReplicationError::Configuration(
                "timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ReplicationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationConfig")
            .field("api_base", &self.api_base)
            .field("repository", &self.repository)
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .field("commit_message", &self.commit_message)
            .finish()
    }
}
