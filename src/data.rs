use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::{Config, NODE_STATUS_PATH};
use crate::routes::RouteTable;

// ========================= WIRE FORMAT =========================

/// Body of the node RPC `/status` response. Every field is required: a
/// missing one fails the whole fetch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    pub result: StatusResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResult {
    pub sync_info: SyncInfo,
    pub node_info: NodeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncInfo {
    pub latest_block_height: String,
    pub latest_block_time: String,
    pub catching_up: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeInfo {
    pub network: String,
    pub version: String,
}

// ========================= DOMAIN =========================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    pub network: String,
    pub version: String,
    pub latest_block_height: String,
    pub latest_block_time: String,
    pub catching_up: bool,
}

impl From<StatusResponse> for NodeStatus {
    fn from(resp: StatusResponse) -> Self {
        let StatusResult { sync_info, node_info } = resp.result;
        Self {
            network: node_info.network,
            version: node_info.version,
            latest_block_height: sync_info.latest_block_height,
            latest_block_time: sync_info.latest_block_time,
            catching_up: sync_info.catching_up,
        }
    }
}

impl NodeStatus {
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str::<StatusResponse>(body)
            .map(Self::from)
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    pub fn sync_label(&self) -> &'static str {
        if self.catching_up { "Syncing" } else { "Synced" }
    }

    /// Block time in local time, or the raw value when it is not RFC 3339.
    pub fn block_time_display(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.latest_block_time) {
            Ok(ts) => ts
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            Err(_) => self.latest_block_time.clone(),
        }
    }
}

// ========================= ERRORS =========================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Failed to reach node: {0}")]
    Network(String),
    #[error("Failed to fetch node status (HTTP {status})")]
    Http { status: u16 },
    #[error("Malformed node status: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Network("request timed out".to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

// ========================= CLIENT =========================

/// Anything that can produce a node status; the poller only sees this.
pub trait StatusSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<NodeStatus, FetchError>> + Send;
}

pub struct StatusClient {
    status_url: Url,
    http: reqwest::Client,
}

impl StatusClient {
    pub fn new(routes: &RouteTable, timeout: Duration) -> eyre::Result<Self> {
        let status_url = routes
            .resolve(NODE_STATUS_PATH)
            .ok_or_else(|| eyre::eyre!("no route for {NODE_STATUS_PATH}"))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { status_url, http })
    }

    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        Self::new(&RouteTable::from_config(config), config.request_timeout)
    }

    pub fn status_url(&self) -> &Url {
        &self.status_url
    }

    pub async fn get_status(&self) -> Result<NodeStatus, FetchError> {
        let resp = self.http.get(self.status_url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        let parsed = NodeStatus::parse(&body)?;
        debug!(height = %parsed.latest_block_height, "node status fetched");
        Ok(parsed)
    }
}

impl StatusSource for StatusClient {
    async fn fetch(&self) -> Result<NodeStatus, FetchError> {
        self.get_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYNCED: &str = r#"{"result":{"sync_info":{"latest_block_height":"100","latest_block_time":"2024-01-01T00:00:00Z","catching_up":false},"node_info":{"network":"pocket","version":"1.0.0"}}}"#;

    #[test]
    fn parses_status_body() {
        let status = NodeStatus::parse(SYNCED).unwrap();
        assert_eq!(status.network, "pocket");
        assert_eq!(status.version, "1.0.0");
        assert_eq!(status.latest_block_height, "100");
        assert_eq!(status.sync_label(), "Synced");
    }

    #[test]
    fn catching_up_reads_syncing() {
        let body = SYNCED.replace("\"catching_up\":false", "\"catching_up\":true");
        assert_eq!(NodeStatus::parse(&body).unwrap().sync_label(), "Syncing");
    }

    #[test]
    fn ignores_extra_fields() {
        let body = r#"{"jsonrpc":"2.0","id":-1,"result":{"node_info":{"network":"n","version":"v","moniker":"m"},"sync_info":{"latest_block_height":"7","latest_block_time":"2024-05-01T10:00:00.123456789Z","catching_up":true,"earliest_block_height":"1"},"validator_info":{}}}"#;
        let status = NodeStatus::parse(body).unwrap();
        assert_eq!(status.latest_block_height, "7");
    }

    #[test]
    fn missing_field_is_parse_error() {
        let body = SYNCED.replace(",\"catching_up\":false", "");
        assert!(matches!(NodeStatus::parse(&body), Err(FetchError::Parse(_))));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(
            NodeStatus::parse("<html>bad gateway</html>"),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn unparsable_block_time_shown_verbatim() {
        let mut status = NodeStatus::parse(SYNCED).unwrap();
        status.latest_block_time = "yesterday".to_string();
        assert_eq!(status.block_time_display(), "yesterday");
    }

    #[test]
    fn block_time_formatted_locally() {
        let status = NodeStatus::parse(SYNCED).unwrap();
        let shown = status.block_time_display();
        assert_eq!(shown.len(), "2024-01-01 00:00:00".len());
        assert!(shown.starts_with("2024-01-01") || shown.starts_with("2023-12-31"));
    }

    #[test]
    fn http_error_text() {
        let err = FetchError::Http { status: 502 };
        assert_eq!(err.to_string(), "Failed to fetch node status (HTTP 502)");
    }
}
