//! Request-level error taxonomy.
//!
//! Every inbound request produces exactly one response envelope; these
//! variants classify the failure paths that synthesize one. None of them is
//! ever allowed to escape a handler as an unhandled fault.
//!
//! Upstream replies that decode badly are not represented here: the
//! normalizer in `http::response` synthesizes their envelope directly, since
//! the diagnostic envelope carries the raw body text.

use axum::http::StatusCode;

use crate::upstream::UpstreamError;

/// Classified failure during request handling.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Inbound body was not valid JSON, or the target override was not a
    /// usable URL. No upstream call is made.
    #[error("invalid request: {0}")]
    MalformedInput(String),

    /// The upstream never produced a usable reply (timeout, connect failure,
    /// TLS error, broken body stream).
    #[error("error forwarding request: {0}")]
    Forwarding(#[from] UpstreamError),

    /// Anything else that went wrong while processing.
    #[error("internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Status presented to the caller. The upstream's real status is only
    /// mirrored when a usable reply existed, which is never the case here.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Failure during process startup. Unlike [`RelayError`], these are fatal:
/// the process exits nonzero instead of serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("invalid upstream url {url}: {source}")]
    UpstreamUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("invalid override header name: {0}")]
    OverrideHeader(String),

    #[error("invalid user agent value: {0}")]
    UserAgent(String),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}
