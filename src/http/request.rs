//! Request preparation for the upstream hop.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) for tracing
//! - Resolve the target URL (per-request override header, else default)
//! - Build the outbound header allow-list
//!
//! # Design Decisions
//! - Outbound headers are an allow-list built fresh per request; inbound
//!   auth/cookie headers are never forwarded to the upstream
//! - The session id is looked up case-insensitively (HeaderMap semantics)
//!   and always emitted under the canonical lower-case key
//! - The override header is consumed here and never propagated

use axum::http::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use axum::http::{HeaderMap, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::config::UpstreamConfig;
use crate::error::{RelayError, StartupError};

/// Canonical session-correlation header, forwarded in both directions.
pub const MCP_SESSION_ID: &str = "mcp-session-id";

/// Request ID header set on every inbound request.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Accept value the upstream requires: it may answer with either encoding.
const ACCEPT_BOTH: &str = "application/json, text/event-stream";

/// UUID v4 request ID generator for `tower_http`'s request-id layers.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Immutable per-request settings derived from the validated config.
///
/// Built once at startup so handlers never re-parse the default URL or the
/// override header name.
#[derive(Clone)]
pub struct ForwardRules {
    default_target: Url,
    override_header: HeaderName,
    user_agent: HeaderValue,
}

impl ForwardRules {
    pub fn from_config(upstream: &UpstreamConfig) -> Result<Self, StartupError> {
        let default_target = Url::parse(&upstream.url).map_err(|source| StartupError::UpstreamUrl {
            url: upstream.url.clone(),
            source,
        })?;
        let override_header = upstream
            .override_header
            .parse::<HeaderName>()
            .map_err(|_| StartupError::OverrideHeader(upstream.override_header.clone()))?;
        let user_agent = HeaderValue::from_str(&upstream.user_agent)
            .map_err(|_| StartupError::UserAgent(upstream.user_agent.clone()))?;

        Ok(Self {
            default_target,
            override_header,
            user_agent,
        })
    }

    pub fn default_target(&self) -> &Url {
        &self.default_target
    }
}

/// Everything the upstream client needs for one call.
#[derive(Debug)]
pub struct ForwardPlan {
    pub target: Url,
    pub headers: HeaderMap,
}

/// Derive the outbound target and header set from the inbound headers.
///
/// Fails (before any upstream call) when the override header carries
/// something that is not an absolute http(s) URL.
pub fn plan_forward(inbound: &HeaderMap, rules: &ForwardRules) -> Result<ForwardPlan, RelayError> {
    let target = match inbound.get(&rules.override_header) {
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| RelayError::MalformedInput("target override is not valid UTF-8".into()))?;
            let url = Url::parse(raw)
                .map_err(|e| RelayError::MalformedInput(format!("invalid target override: {e}")))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(RelayError::MalformedInput(format!(
                    "invalid target override scheme: {}",
                    url.scheme()
                )));
            }
            url
        }
        None => rules.default_target.clone(),
    };

    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_BOTH));
    headers.insert(USER_AGENT, rules.user_agent.clone());
    if let Some(session) = inbound.get(MCP_SESSION_ID) {
        headers.insert(MCP_SESSION_ID, session.clone());
    }

    Ok(ForwardPlan { target, headers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ForwardRules {
        ForwardRules::from_config(&UpstreamConfig::default()).unwrap()
    }

    fn inbound(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn default_target_when_no_override() {
        let plan = plan_forward(&inbound(&[]), &rules()).unwrap();
        assert_eq!(plan.target.as_str(), "https://mcp.context7.com/mcp");
    }

    #[test]
    fn override_header_selects_target_and_is_not_forwarded() {
        let plan = plan_forward(
            &inbound(&[("x-upstream-url", "http://127.0.0.1:9000/mcp")]),
            &rules(),
        )
        .unwrap();
        assert_eq!(plan.target.as_str(), "http://127.0.0.1:9000/mcp");
        assert!(!plan.headers.contains_key("x-upstream-url"));
    }

    #[test]
    fn invalid_override_fails_before_forwarding() {
        let result = plan_forward(&inbound(&[("x-upstream-url", "not a url")]), &rules());
        assert!(matches!(result, Err(RelayError::MalformedInput(_))));
    }

    #[test]
    fn non_http_override_is_rejected() {
        let result = plan_forward(&inbound(&[("x-upstream-url", "file:///etc/passwd")]), &rules());
        assert!(matches!(result, Err(RelayError::MalformedInput(_))));
    }

    #[test]
    fn session_id_forwarded_under_canonical_key() {
        // HeaderMap lookups are case-insensitive, so either inbound spelling
        // lands under the same canonical key.
        for spelling in ["mcp-session-id", "MCP-Session-Id"] {
            let plan = plan_forward(&inbound(&[(spelling, "abc123")]), &rules()).unwrap();
            assert_eq!(plan.headers.get(MCP_SESSION_ID).unwrap(), "abc123");
        }
    }

    #[test]
    fn no_session_header_when_absent_inbound() {
        let plan = plan_forward(&inbound(&[]), &rules()).unwrap();
        assert!(!plan.headers.contains_key(MCP_SESSION_ID));
    }

    #[test]
    fn inbound_headers_are_never_copied_wholesale() {
        let plan = plan_forward(
            &inbound(&[
                ("authorization", "Bearer secret"),
                ("cookie", "sid=1"),
                ("mcp-session-id", "abc123"),
            ]),
            &rules(),
        )
        .unwrap();

        let keys: Vec<_> = plan.headers.keys().map(|k| k.as_str()).collect();
        assert_eq!(plan.headers.len(), 4);
        for key in ["content-type", "accept", "user-agent", "mcp-session-id"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert!(!plan.headers.contains_key("authorization"));
        assert!(!plan.headers.contains_key("cookie"));
    }
}
