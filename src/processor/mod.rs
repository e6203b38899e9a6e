//! Wire contract for stdin/stdout processor filters.
//!
//! Filter programs can sit in front of or behind the relay: each reads one
//! JSON event object from standard input and writes exactly one JSON result
//! object to standard output, exiting zero even when the result carries a
//! 4xx/5xx status (the exit code only says the filter itself ran). The relay
//! does not execute processors; it defines the shared shapes so any number
//! of filters can be chained without altering the request/response contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of the message a processor is inspecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Request,
    Response,
}

/// Connection metadata accompanying every event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(default)]
    pub server_name: String,

    #[serde(default)]
    pub transport: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Chain metadata: which processors already ran, and the payload as it was
/// before any of them touched it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub processor_chain: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_payload: Option<Value>,
}

/// One event handed to a processor on stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,

    pub timestamp: DateTime<Utc>,

    pub connection: ConnectionInfo,

    /// The MCP message payload, treated as opaque JSON.
    pub payload: Value,

    #[serde(default)]
    pub metadata: EventMetadata,
}

impl ProcessorEvent {
    pub fn request(payload: Value) -> Self {
        Self::new(EventKind::Request, payload)
    }

    pub fn response(payload: Value) -> Self {
        Self::new(EventKind::Response, payload)
    }

    fn new(kind: EventKind, payload: Value) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            connection: ConnectionInfo::default(),
            payload,
            metadata: EventMetadata::default(),
        }
    }
}

/// Metadata a processor reports about its own run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(default)]
    pub processor_name: String,

    #[serde(default)]
    pub modifications: Vec<String>,
}

/// The single result a processor writes to stdout.
///
/// `status` carries the semantic outcome (200 pass, 4xx block, 5xx fault);
/// the process exit code stays zero either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorResult {
    pub status: u16,

    pub payload: Value,

    pub error: Option<String>,

    #[serde(default)]
    pub metadata: ResultMetadata,
}

impl ProcessorResult {
    /// Passthrough success: payload unchanged.
    pub fn pass(payload: Value, processor_name: impl Into<String>) -> Self {
        Self {
            status: 200,
            payload,
            error: None,
            metadata: ResultMetadata {
                processor_name: processor_name.into(),
                modifications: Vec::new(),
            },
        }
    }

    /// Rejection with a semantic status and reason.
    pub fn reject(status: u16, error: impl Into<String>, processor_name: impl Into<String>) -> Self {
        Self {
            status,
            payload: Value::Object(Default::default()),
            error: Some(error.into()),
            metadata: ResultMetadata {
                processor_name: processor_name.into(),
                modifications: Vec::new(),
            },
        }
    }
}
