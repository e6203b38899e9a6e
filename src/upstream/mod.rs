//! Upstream hop subsystem.
//!
//! # Data Flow
//! ```text
//! ForwardPlan (target + allow-listed headers)
//!     → client.rs (single POST, fixed timeout)
//!     → UpstreamReply (status, content type, headers, buffered body)
//!     → http::response normalizer
//! ```
//!
//! # Design Decisions
//! - One shared pooled client; no state crosses request boundaries
//! - Transport failures and error-status replies are distinct outcomes
//! - No retries: a single round trip is the entire unit of work

pub mod client;

pub use client::{ProbeStatus, UpstreamClient, UpstreamError, UpstreamReply};
