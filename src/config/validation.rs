//! Semantic configuration validation.
//!
//! Serde handles the syntactic layer; this module checks the things a parse
//! cannot: addresses that bind, URLs that resolve to absolute endpoints,
//! header names that are legal on the wire.

use std::net::SocketAddr;

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration, collecting every failure.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".into(),
            message: format!("not a socket address: {}", config.listener.bind_address),
        });
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError {
            field: "listener.max_body_bytes".into(),
            message: "must be nonzero".into(),
        });
    }

    match Url::parse(&config.upstream.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError {
            field: "upstream.url".into(),
            message: format!("unsupported scheme: {}", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError {
            field: "upstream.url".into(),
            message: format!("not a URL: {e}"),
        }),
    }

    if config
        .upstream
        .override_header
        .parse::<HeaderName>()
        .is_err()
    {
        errors.push(ValidationError {
            field: "upstream.override_header".into(),
            message: format!("not a header name: {}", config.upstream.override_header),
        });
    }

    for (field, value) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.probe_secs", config.timeouts.probe_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError {
                field: field.into(),
                message: "must be nonzero".into(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
