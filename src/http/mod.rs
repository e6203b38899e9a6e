//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound POST /
//!     → server.rs (Axum setup, middleware, orchestration)
//!     → request.rs (validate body, build target + header allow-list)
//!     → [upstream client performs the single hop]
//!     → response.rs (normalize JSON/SSE reply, echo session id)
//!     → Envelope sent to caller
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ForwardPlan, ForwardRules, MakeRequestUuid, MCP_SESSION_ID, X_REQUEST_ID};
pub use response::{normalize, Envelope};
pub use server::HttpServer;
