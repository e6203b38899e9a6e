//! MCP Relay Proxy Library
//!
//! A single-hop protocol translation proxy: inbound MCP requests over HTTP
//! are forwarded to one upstream MCP endpoint, and the upstream's two reply
//! encodings (plain JSON and SSE-framed JSON) are reconciled into a single
//! uniform JSON response, with the session-id header propagated across the
//! hop in both directions.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod processor;
pub mod upstream;

pub use config::RelayConfig;
pub use error::{RelayError, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
