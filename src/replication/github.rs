//! GitHub contents API remote
//!
//! - GET  `{api}/repos/{owner}/{repo}/contents/{path}?ref={branch}`
//!   returns `{sha, content}` with base64 content wrapped at 60 columns
//! - PUT  same URL with `{message, content, branch, sha?}`; `sha` must be the
//!   blob currently at that path, which is what makes the write conditional
//!
//! Status mapping: 404 on GET = absent, 401/403 = Auth, 409/422 = Conflict
//! (stale or missing `sha`), anything else non-2xx = Protocol.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::config::ReplicationConfig;
use super::errors::{ReplicationError, ReplicationResult};
use super::remote::{RemoteContent, RemoteDocument, RemoteVersion};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const ERROR_BODY_MAX: usize = 200;

#[derive(Debug)]
pub struct GitHubContents {
    client: reqwest::Client,
    url: String,
    branch: String,
    token: Option<String>,
    commit_message: String,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

impl GitHubContents {
    pub fn new(config: &ReplicationConfig) -> ReplicationResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("rolecall/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReplicationError::Configuration(e.to_string()))?;

        let url = format!(
            "{}/repos/{}/contents/{}",
            config.api_base.trim_end_matches('/'),
            config.repository,
            config.path.trim_matches('/'),
        );

        Ok(Self {
            client,
            url,
            branch: config.branch.clone(),
            token: config.token.clone(),
            commit_message: config.commit_message.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let request = self
            .client
            .request(method, &self.url)
            .header(ACCEPT, GITHUB_MEDIA_TYPE);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ReplicationError {
        if e.is_timeout() {
            ReplicationError::Timeout(self.timeout_ms)
        } else {
            ReplicationError::Network(e.to_string())
        }
    }

    async fn status_error(response: Response) -> ReplicationError {
        let status = response.status();
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_MAX {
            let mut cut = ERROR_BODY_MAX;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        let detail = format!("{}: {}", status, body.trim());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReplicationError::Auth(detail),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                ReplicationError::Conflict(detail)
            }
            _ => ReplicationError::Protocol(detail),
        }
    }
}

#[async_trait]
impl RemoteContent for GitHubContents {
    async fn fetch(&self) -> ReplicationResult<Option<RemoteDocument>> {
        let response = self
            .request(Method::GET)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| ReplicationError::Protocol(format!("contents body: {}", e)))?;

        if let Some(encoding) = body.encoding.as_deref() {
            if encoding != "base64" {
                return Err(ReplicationError::Protocol(format!(
                    "unsupported content encoding '{}'",
                    encoding
                )));
            }
        }
        let packed: String = body.content.split_whitespace().collect();
        let content = STANDARD
            .decode(packed)
            .map_err(|e| ReplicationError::Protocol(format!("content not base64: {}", e)))?;

        Ok(Some(RemoteDocument {
            content,
            version: RemoteVersion::new(body.sha),
        }))
    }

    async fn put(
        &self,
        content: &[u8],
        expected: Option<&RemoteVersion>,
    ) -> ReplicationResult<RemoteVersion> {
        let body = PutRequest {
            message: &self.commit_message,
            content: STANDARD.encode(content),
            branch: &self.branch,
            sha: expected.map(RemoteVersion::as_str),
        };

        let response = self
            .request(Method::PUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let written: PutResponse = response
            .json()
            .await
            .map_err(|e| ReplicationError::Protocol(format!("put body: {}", e)))?;
        Ok(RemoteVersion::new(written.content.sha))
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.url, self.branch)
    }
}
