//! IPFS (Kubo HTTP RPC) content store.

use a2a_canonical::ContentId;
use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::StoreError;
use crate::traits::ContentStore;

fn default_api_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Connection settings for a Kubo node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpfsConfig {
    /// Base URL of the RPC API (without `/api/v0`).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(rename = "Version")]
    version: String,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(rename = "Message")]
    message: String,
}

/// Content store backed by a Kubo node.
///
/// Bytes are uploaded as an opaque file with CIDv1 and raw leaves, and read
/// back with `cat`, so the node never re-encodes them.
#[derive(Debug, Clone)]
pub struct IpfsStore {
    base_url: String,
    client: Client,
}

impl IpfsStore {
    /// Creates a store for the configured node.
    pub fn new(config: &IpfsConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Protocol(e.to_string()))?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL of the node.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/api/v0/{}", self.base_url, command)
    }

    /// Node version string.
    pub async fn version(&self) -> Result<String, StoreError> {
        let resp = self
            .client
            .post(self.endpoint("version"))
            .send()
            .await
            .map_err(classify_send_error)?;
        let resp = check_status(resp, None).await?;
        let body: VersionResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Protocol(e.to_string()))?;
        Ok(body.version)
    }

    /// True when the node answers `version`.
    pub async fn is_online(&self) -> bool {
        self.version().await.is_ok()
    }

    async fn pin_command(&self, command: &str, cid: &ContentId) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(self.endpoint(command))
            .query(&[("arg", cid.as_str())])
            .send()
            .await
            .map_err(classify_send_error)?;
        check_status(resp, Some(cid)).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for IpfsStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError> {
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name("trace.json")
            .mime_str("application/octet-stream")
            .map_err(|e| StoreError::Protocol(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(url = %self.endpoint("add"), size = bytes.len(), "uploading content");
        let resp = self
            .client
            .post(self.endpoint("add"))
            .query(&[
                ("cid-version", "1"),
                ("raw-leaves", "true"),
                ("hash", "sha2-256"),
                ("pin", "false"),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(classify_send_error)?;
        let resp = check_status(resp, None).await?;
        let text = resp.text().await.map_err(classify_send_error)?;
        parse_add_response(&text)
    }

    async fn get(&self, cid: &ContentId) -> Result<Vec<u8>, StoreError> {
        let resp = self
            .client
            .post(self.endpoint("cat"))
            .query(&[("arg", cid.as_str())])
            .send()
            .await
            .map_err(classify_send_error)?;
        let resp = check_status(resp, Some(cid)).await?;
        let bytes = resp.bytes().await.map_err(classify_send_error)?;
        Ok(bytes.to_vec())
    }

    async fn pin(&self, cid: &ContentId) -> Result<(), StoreError> {
        self.pin_command("pin/add", cid).await
    }

    async fn unpin(&self, cid: &ContentId) -> Result<(), StoreError> {
        self.pin_command("pin/rm", cid).await
    }
}

async fn check_status(
    resp: reqwest::Response,
    cid: Option<&ContentId>,
) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_error_response(status, &body, cid))
}

fn classify_send_error(err: reqwest::Error) -> StoreError {
    if err.is_decode() || (err.is_body() && !err.is_timeout()) {
        StoreError::Protocol(err.to_string())
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

/// Maps a non-success RPC response to a store error.
///
/// Kubo reports most failures as HTTP 500 with a JSON `Message`; lookups of
/// content it does not have surface as `NotFound` when a cid is involved.
pub(crate) fn classify_error_response(
    status: StatusCode,
    body: &str,
    cid: Option<&ContentId>,
) -> StoreError {
    let message = serde_json::from_str::<RpcError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    ) {
        return StoreError::Unavailable(format!("{}: {}", status, message));
    }

    if let Some(cid) = cid {
        let lowered = message.to_lowercase();
        let missing = ["not found", "no link named", "invalid path", "not pinned", "failed to resolve"];
        if missing.iter().any(|needle| lowered.contains(needle)) {
            return StoreError::NotFound(cid.clone());
        }
    }

    StoreError::Protocol(format!("{}: {}", status, message))
}

/// Extracts the root CID from an `add` response.
///
/// The response is newline-delimited JSON, one object per added entry; the
/// last one names the root.
pub(crate) fn parse_add_response(text: &str) -> Result<ContentId, StoreError> {
    let last = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| StoreError::Protocol("empty add response".to_string()))?;
    let parsed: AddResponse =
        serde_json::from_str(last).map_err(|e| StoreError::Protocol(e.to_string()))?;
    Ok(ContentId::parse(parsed.hash)?)
}
