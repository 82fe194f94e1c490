//! Remote content abstraction
//!
//! A remote holds one document and a version marker that changes on every
//! write. Writes are conditional on the marker.

use std::fmt;

use async_trait::async_trait;

use super::errors::ReplicationResult;

/// Opaque version marker (a blob SHA for the GitHub contents API)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteVersion(String);

impl RemoteVersion {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current remote content with its version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub content: Vec<u8>,
    pub version: RemoteVersion,
}

#[async_trait]
pub trait RemoteContent: Send + Sync + fmt::Debug {
    /// Read the current document. `None` if it does not exist yet.
    async fn fetch(&self) -> ReplicationResult<Option<RemoteDocument>>;

    /// Write `content` only if the remote is still at `expected`
    /// (`None` = the document must not exist yet). Returns the new version.
    async fn put(
        &self,
        content: &[u8],
        expected: Option<&RemoteVersion>,
    ) -> ReplicationResult<RemoteVersion>;

    /// Target description for logs. Must not contain credentials.
    fn describe(&self) -> String;
}
