//! Path-prefix rewrite table mapping dashboard API paths onto backend hosts.
//!
//! Mirrors the forwarding rules the dashboard's hosting runtime applies:
//! `/api/node/*` goes to the node RPC and `/api/gateway/*` to the gateway.
//! The table is fixed once built.
use url::Url;

use crate::config::{Config, GATEWAY_PREFIX, NODE_PREFIX};

#[derive(Debug, Clone)]
pub struct Route {
    pub prefix: String,
    pub destination: Url,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        let routes = routes
            .into_iter()
            .map(|r| Route {
                prefix: format!("/{}", r.prefix.trim_matches('/')),
                destination: r.destination,
            })
            .collect();
        Self { routes }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            Route {
                prefix: NODE_PREFIX.to_string(),
                destination: config.node_url.clone(),
            },
            Route {
                prefix: GATEWAY_PREFIX.to_string(),
                destination: config.gateway_url.clone(),
            },
        ])
    }

    /// Rewrites `path` (optionally carrying a query string) onto the first
    /// matching destination. Prefixes only match on segment boundaries.
    pub fn resolve(&self, path: &str) -> Option<Url> {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };

        self.routes.iter().find_map(|route| {
            let rest = path.strip_prefix(route.prefix.as_str())?;
            if !(rest.is_empty() || rest.starts_with('/')) {
                return None;
            }
            let mut url = route.destination.clone();
            let joined = format!(
                "{}/{}",
                url.path().trim_end_matches('/'),
                rest.trim_start_matches('/')
            );
            url.set_path(&joined);
            url.set_query(query);
            Some(url)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new(vec![
            Route {
                prefix: "/api/node".to_string(),
                destination: Url::parse("http://localhost:26657").unwrap(),
            },
            Route {
                prefix: "api/gateway/".to_string(),
                destination: Url::parse("http://gw.local:3069/v1/").unwrap(),
            },
        ])
    }

    #[test]
    fn rewrites_node_status() {
        let url = table().resolve("/api/node/status").unwrap();
        assert_eq!(url.as_str(), "http://localhost:26657/status");
    }

    #[test]
    fn keeps_destination_base_path_and_query() {
        let url = table().resolve("/api/gateway/relay/x?app=1").unwrap();
        assert_eq!(url.as_str(), "http://gw.local:3069/v1/relay/x?app=1");
    }

    #[test]
    fn bare_prefix_maps_to_destination_root() {
        let url = table().resolve("/api/node").unwrap();
        assert_eq!(url.as_str(), "http://localhost:26657/");
    }

    #[test]
    fn prefix_must_end_on_segment_boundary() {
        assert!(table().resolve("/api/nodes/status").is_none());
        assert!(table().resolve("/other").is_none());
    }

    #[test]
    fn prefixes_are_normalized() {
        // Registered as "api/gateway/" but matched as "/api/gateway".
        let url = table().resolve("/api/gateway").unwrap();
        assert_eq!(url.as_str(), "http://gw.local:3069/v1/");
        assert!(table().resolve("api/gateway").is_none());
    }
}
