//! Response normalization for the caller.
//!
//! # Responsibilities
//! - Reconcile the upstream's two reply encodings (plain JSON, SSE-framed
//!   JSON) into one uniform JSON response
//! - Echo the upstream's session id back to the caller
//! - Synthesize diagnostic envelopes for undecodable streams
//!
//! # Design Decisions
//! - JSON decode failures are lenient: logged, payload becomes `{}`, the
//!   upstream status is still mirrored
//! - SSE decode failures are not: the caller gets a 500 carrying the raw
//!   stream text, because an event stream with no payload means the reply
//!   was lost in translation
//! - Exactly the first `data: ` line is used; the upstream emits one
//!   JSON-RPC reply per call, not a true multi-event stream

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use crate::http::request::MCP_SESSION_ID;
use crate::upstream::UpstreamReply;

/// Marker prefixing the payload line of an SSE frame.
const SSE_DATA_PREFIX: &str = "data: ";

/// The single artifact returned to the caller: one per inbound request,
/// always a complete JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: StatusCode,
    pub payload: Value,
    pub session_id: Option<HeaderValue>,
}

impl Envelope {
    /// Error envelope with a `{"error": ...}` payload.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            payload: json!({ "error": message.into() }),
            session_id: None,
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let mut response = (self.status, axum::Json(self.payload)).into_response();
        if let Some(session) = self.session_id {
            response.headers_mut().insert(MCP_SESSION_ID, session);
        }
        response
    }
}

/// Decode one upstream reply into the caller-facing envelope.
pub fn normalize(reply: UpstreamReply) -> Envelope {
    let session_id = reply.headers.get(MCP_SESSION_ID).cloned();

    if reply.content_type.contains("text/event-stream") {
        return normalize_event_stream(reply.status, &reply.body, session_id);
    }

    let payload = if reply.content_type.contains("application/json") {
        match serde_json::from_slice::<Value>(&reply.body) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "upstream declared JSON but body did not decode");
                json!({})
            }
        }
    } else {
        // Unexpected content type: mirror the status, drop the body.
        json!({})
    };

    Envelope {
        status: reply.status,
        payload,
        session_id,
    }
}

/// Extract the single JSON payload embedded in an SSE stream.
///
/// The first `data: ` line wins; anything after it is ignored. A stream with
/// no decodable data line yields a 500 carrying the raw text for diagnostics.
fn normalize_event_stream(
    status: StatusCode,
    body: &[u8],
    session_id: Option<HeaderValue>,
) -> Envelope {
    let text = String::from_utf8_lossy(body);

    let payload = text
        .lines()
        .find_map(|line| line.strip_prefix(SSE_DATA_PREFIX))
        .and_then(|data| serde_json::from_str::<Value>(data).ok());

    match payload {
        Some(payload) => Envelope {
            status,
            payload,
            session_id,
        },
        None => {
            tracing::error!("event stream carried no decodable data line");
            Envelope {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                payload: json!({
                    "error": "Failed to parse streaming response",
                    "raw": text,
                }),
                session_id,
            }
        }
    }
}
