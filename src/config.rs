//! Configuration parameters for the gateway dashboard
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use eyre::{Result, bail};
use url::Url;

/// Path the dashboard requests node status from, before prefix rewriting
pub const NODE_STATUS_PATH: &str = "/api/node/status";
pub const NODE_PREFIX: &str = "/api/node";
pub const GATEWAY_PREFIX: &str = "/api/gateway";

/// Fixed polling cadence, independent of failures
pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// A successful status older than this is flagged stale on the card
pub const STALE_AFTER: Duration = Duration::from_secs(20);

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

pub const DEFAULT_NODE_URL: &str = "http://localhost:26657";
pub const DEFAULT_GRPC_ADDR: &str = "localhost:9090";
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3069";
pub const DEFAULT_DOCS_URL: &str = "http://localhost:3000";

#[derive(Debug, Parser)]
#[command(name = "gateway-dashboard", version, about = "Terminal dashboard for a node and its gateway")]
pub struct Args {
    /// Node RPC base URL that `/api/node/*` is forwarded to
    #[arg(long, env = "NODE_RPC_URL", default_value = DEFAULT_NODE_URL)]
    pub node_url: String,

    /// Gateway base URL that `/api/gateway/*` is forwarded to
    #[arg(long, env = "GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// Node gRPC address, shown on the System Info card
    #[arg(long, env = "NODE_GRPC_ADDR", default_value = DEFAULT_GRPC_ADDR)]
    pub grpc_addr: String,

    /// Documentation URL opened with the `d` key
    #[arg(long, env = "DOCS_URL", default_value = DEFAULT_DOCS_URL)]
    pub docs_url: String,

    /// Milliseconds between status polls
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = POLL_INTERVAL.as_millis() as u64)]
    pub poll_interval_ms: u64,

    /// Per-request timeout in milliseconds; must be below the poll interval
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = REQUEST_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Where to write logs; the terminal belongs to the dashboard
    #[arg(long, env = "DASHBOARD_LOG")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node_url: Url,
    pub gateway_url: Url,
    pub grpc_addr: String,
    pub docs_url: Url,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        if args.poll_interval_ms == 0 {
            bail!("poll interval must be greater than zero");
        }
        if args.timeout_ms == 0 {
            bail!("request timeout must be greater than zero");
        }
        if args.timeout_ms >= args.poll_interval_ms {
            bail!(
                "request timeout ({}ms) must be below the poll interval ({}ms)",
                args.timeout_ms,
                args.poll_interval_ms
            );
        }

        Ok(Self {
            node_url: parse_http_url("node url", &args.node_url)?,
            gateway_url: parse_http_url("gateway url", &args.gateway_url)?,
            grpc_addr: args.grpc_addr,
            docs_url: parse_http_url("docs url", &args.docs_url)?,
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            request_timeout: Duration::from_millis(args.timeout_ms),
            log_file: args
                .log_file
                .unwrap_or_else(|| std::env::temp_dir().join("gateway-dashboard.log")),
        })
    }

    /// Age after which the last good status is flagged stale. Never shorter
    /// than four poll intervals.
    pub fn stale_after(&self) -> Duration {
        STALE_AFTER.max(self.poll_interval * 4)
    }
}

fn parse_http_url(what: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| eyre::eyre!("invalid {what} {raw:?}: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("invalid {what} {raw:?}: unsupported scheme {other:?}"),
    }
}
