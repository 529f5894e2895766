//! Terminal dashboard that polls a node's status endpoint and shows it next
//! to the gateway and system endpoints it is configured with.
pub mod config;
pub mod data;
pub mod poll;
pub mod routes;
pub mod ui;
