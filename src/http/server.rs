//! HTTP server setup and request orchestration.
//!
//! # Responsibilities
//! - Create the Axum router with the three endpoints
//! - Wire up middleware (timeout, request ID, tracing)
//! - Orchestrate forward requests: validate body → plan headers/target →
//!   single upstream call → normalize reply → envelope
//! - Classify every failure into a structured envelope; nothing escapes a
//!   handler as an unhandled fault
//!
//! # Endpoints
//! - `POST /`      forward one MCP request to the upstream
//! - `GET  /`      liveness/info
//! - `GET  /health` upstream reachability probe

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::error::{RelayError, StartupError};
use crate::http::request::{plan_forward, ForwardRules, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::{normalize, Envelope};
use crate::observability::metrics;
use crate::upstream::{ProbeStatus, UpstreamClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: UpstreamClient,
    pub rules: Arc<ForwardRules>,
    pub config: Arc<RelayConfig>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Builds the shared upstream client here so it lives for the process
    /// and is dropped on every shutdown path.
    pub fn new(config: RelayConfig) -> Result<Self, StartupError> {
        let client = UpstreamClient::new(&config.upstream, &config.timeouts)?;
        let rules = Arc::new(ForwardRules::from_config(&config.upstream)?);

        let state = AppState {
            client,
            rules,
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let request_id_header = HeaderName::from_static(X_REQUEST_ID);

        // The handler timeout sits above the upstream timeout so a slow
        // upstream surfaces as a structured envelope, not a cut connection.
        let handler_timeout = Duration::from_secs(config.timeouts.request_secs + 5);

        Router::new()
            .route("/", get(info_handler).post(forward_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(
                        request_id_header.clone(),
                        MakeRequestUuid,
                    ))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id_header))
                    .layer(TimeoutLayer::new(handler_timeout)),
            )
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxy_target = %self.config.upstream.url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Forward handler: one upstream round trip, one envelope, every time.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();

    let (envelope, outcome) = match handle_forward(&state, &parts.headers, body).await {
        Ok(envelope) => (envelope, "forwarded"),
        Err(error) => {
            let outcome = match &error {
                RelayError::MalformedInput(_) => "malformed_input",
                RelayError::Forwarding(_) => "forwarding_error",
                RelayError::Internal(_) => "internal_error",
            };
            tracing::error!(request_id = %request_id, error = %error, "Request failed");
            (Envelope::error(error.status(), error.to_string()), outcome)
        }
    };

    tracing::debug!(
        request_id = %request_id,
        status = %envelope.status,
        outcome,
        "Request complete"
    );
    metrics::record_request("POST", envelope.status.as_u16(), outcome, start);

    envelope.into_response()
}

/// The fallible part of forwarding, classified by [`RelayError`].
async fn handle_forward(
    state: &AppState,
    inbound: &HeaderMap,
    body: Body,
) -> Result<Envelope, RelayError> {
    let bytes = axum::body::to_bytes(body, state.config.listener.max_body_bytes)
        .await
        .map_err(|e| RelayError::Internal(format!("failed to read request body: {e}")))?;

    // The body must be syntactically valid JSON before any upstream call;
    // the parsed value is only used for logging, the raw bytes are forwarded.
    let parsed: Value = serde_json::from_slice(&bytes)
        .map_err(|e| RelayError::MalformedInput(format!("body is not valid JSON: {e}")))?;
    let method = parsed
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let plan = plan_forward(inbound, &state.rules)?;

    tracing::info!(upstream = %plan.target, method, "Forwarding MCP request");

    let reply = state.client.send(plan.target, plan.headers, bytes).await?;

    Ok(normalize(reply))
}

/// Liveness/info endpoint.
async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "proxy_target": state.rules.default_target().as_str(),
    }))
}

/// Health endpoint: probes the default upstream with the short timeout.
///
/// Probe failures surface as fields in the body; the endpoint itself always
/// answers 200 with a status report.
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let status = state.client.probe(state.rules.default_target().clone()).await;
    metrics::record_probe(status == ProbeStatus::Healthy);

    let mut body = json!({
        "proxy_status": "healthy",
        "upstream_status": status.as_str(),
        "proxy_target": state.rules.default_target().as_str(),
    });
    if let ProbeStatus::Unreachable(reason) = &status {
        body["error"] = json!(reason);
    }
    if let ProbeStatus::Unhealthy(code) = &status {
        body["upstream_http_status"] = json!(code.as_u16());
    }

    Json(body)
}
