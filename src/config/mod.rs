//! Process configuration
//!
//! Sources, later wins:
//! 1. Built-in defaults
//! 2. JSON config file (`--config`), every field optional
//! 3. Environment variables (a `.env` file is loaded by the CLI first)
//!
//! | Variable | Field |
//! |---|---|
//! | `BOT_TOKEN` | `bot_token` |
//! | `ROLECALL_DATA_PATH` | `data_path` |
//! | `ROLECALL_LOG_LEVEL` | `log_level` |
//! | `ROLECALL_REPLICATION_REPO` | `replication.repository` (enables replication) |
//! | `ROLECALL_REPLICATION_PATH` | `replication.path` |
//! | `ROLECALL_REPLICATION_BRANCH` | `replication.branch` |
//! | `ROLECALL_REPLICATION_TOKEN`, then `GITHUB_TOKEN` | `replication.token` |
//! | `ROLECALL_HTTP_PORT` | `http.port` (enables the HTTP surface) |
//!
//! Read once at startup; the core receives plain values.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::observability::Severity;
use crate::replication::ReplicationConfig;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat platform credential
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,

    /// Bot username; suffixed commands for other bots are ignored
    #[serde(default)]
    pub bot_name: Option<String>,

    /// Snapshot file (default: "./data/roles.json")
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Start empty instead of refusing to start on a corrupt snapshot
    #[serde(default)]
    pub tolerate_corrupt_snapshot: bool,

    /// Bound on one snapshot save (default: 5000)
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Remote copy; absent = replication disabled
    #[serde(default)]
    pub replication: Option<ReplicationConfig>,

    /// Group id → user ids allowed to manage roles there
    #[serde(default)]
    pub admins: HashMap<String, Vec<String>>,

    /// User ids allowed to manage roles in every group
    #[serde(default)]
    pub global_admins: Vec<String>,

    /// HTTP surface; absent = disabled
    #[serde(default)]
    pub http: Option<HttpServerConfig>,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data/roles.json")
}
fn default_store_timeout_ms() -> u64 {
    5_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: None,
            bot_name: None,
            data_path: default_data_path(),
            tolerate_corrupt_snapshot: false,
            store_timeout_ms: default_store_timeout_ms(),
            log_level: default_log_level(),
            replication: None,
            admins: HashMap::new(),
            global_admins: Vec::new(),
            http: None,
        }
    }
}

impl Config {
    /// Defaults, then the file if given, then the process environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let location = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: location.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: location,
            source,
        })
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env_with<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("BOT_TOKEN") {
            self.bot_token = Some(token);
        }
        if let Some(path) = var("ROLECALL_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(level) = var("ROLECALL_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(repo) = var("ROLECALL_REPLICATION_REPO") {
            match self.replication.as_mut() {
                Some(replication) => replication.repository = repo,
                None => self.replication = Some(ReplicationConfig::new(repo)),
            }
        }
        if let Some(replication) = self.replication.as_mut() {
            if let Some(path) = var("ROLECALL_REPLICATION_PATH") {
                replication.path = path;
            }
            if let Some(branch) = var("ROLECALL_REPLICATION_BRANCH") {
                replication.branch = branch;
            }
            if let Some(token) = var("ROLECALL_REPLICATION_TOKEN").or_else(|| var("GITHUB_TOKEN")) {
                replication.token = Some(token);
            }
        }

        if let Some(port) = var("ROLECALL_HTTP_PORT") {
            let port: u16 = port.trim().parse().map_err(|_| {
                ConfigError::invalid("ROLECALL_HTTP_PORT", format!("'{}' is not a port", port))
            })?;
            self.http.get_or_insert_with(HttpServerConfig::default).port = port;
        }

        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::invalid("store_timeout_ms", "must be > 0"));
        }
        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::invalid(
                "log_level",
                format!(
                    "'{}' is not one of trace, info, warn, error, fatal",
                    self.log_level
                ),
            ));
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("data_path", "must not be empty"));
        }
        if let Some(replication) = &self.replication {
            replication.validate()?;
        }
        if let Some(http) = &self.http {
            http.validate()
                .map_err(|message| ConfigError::invalid("http", message))?;
        }
        Ok(())
    }

    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("bot_name", &self.bot_name)
            .field("data_path", &self.data_path)
            .field("tolerate_corrupt_snapshot", &self.tolerate_corrupt_snapshot)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("log_level", &self.log_level)
            .field("replication", &self.replication)
            .field("admins", &self.admins)
            .field("global_admins", &self.global_admins)
            .field("http", &self.http)
            .finish()
    }
}
