//! Shared HTTP client for the single upstream hop.
//!
//! # Responsibilities
//! - One POST per inbound request, fixed total timeout
//! - Short-timeout GET probe for the /health endpoint
//! - Classify transport failures so callers can tell "never got a usable
//!   reply" from "got a reply with an error status"
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` built at startup, shared by all in-flight
//!   requests; headers and body are constructed fresh per call
//! - Non-2xx statuses are NOT errors here; the handler mirrors them

use axum::body::Bytes;
use axum::http::HeaderMap;
use std::time::Duration;
use url::Url;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::StartupError;

/// Transport-level failure contacting the upstream.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl UpstreamError {
    fn classify(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            UpstreamError::Timeout
        } else if error.is_connect() {
            UpstreamError::Connect(error.to_string())
        } else {
            UpstreamError::Transport(error.to_string())
        }
    }
}

/// One fully buffered upstream reply.
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: axum::http::StatusCode,
    pub content_type: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Result of the short-timeout liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Upstream answered with a 2xx.
    Healthy,
    /// Upstream answered, but not with a 2xx.
    Unhealthy(axum::http::StatusCode),
    /// No usable reply at all.
    Unreachable(String),
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Healthy => "healthy",
            ProbeStatus::Unhealthy(_) => "unhealthy",
            ProbeStatus::Unreachable(_) => "unreachable",
        }
    }
}

/// Pooled HTTP client for the upstream MCP endpoint.
///
/// Constructed once at startup and dropped at shutdown; holds no per-request
/// state.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    probe_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, StartupError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .user_agent(upstream.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            probe_timeout: Duration::from_secs(timeouts.probe_secs),
        })
    }

    /// Forward one MCP request body to `target`. Exactly one network call;
    /// no retries.
    pub async fn send(
        &self,
        target: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamReply, UpstreamError> {
        let response = self
            .http
            .post(target)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(UpstreamError::classify)?;

        let status = response.status();
        let headers = response.headers().clone();
        let content_type = headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Body(e.to_string()))?;

        Ok(UpstreamReply {
            status,
            content_type,
            headers,
            body,
        })
    }

    /// Probe the upstream for the /health endpoint. The probe body is
    /// intentionally discarded; only reachability is reported.
    pub async fn probe(&self, target: Url) -> ProbeStatus {
        let result = self
            .http
            .get(target)
            .timeout(self.probe_timeout)
            .header(
                axum::http::header::ACCEPT,
                "application/json, text/event-stream",
            )
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => ProbeStatus::Healthy,
            Ok(response) => ProbeStatus::Unhealthy(response.status()),
            Err(error) => ProbeStatus::Unreachable(UpstreamError::classify(error).to_string()),
        }
    }
}
