//! HTTP transport.
//!
//! Routes:
//! - `POST /mcp`: JSON-RPC tool-call surface
//! - `GET /mcp`: comment-only keepalive stream
//! - `POST /v1/execute`: plain request/response surface
//! - `GET|POST /healthz` (and `/healthz/`, `/v1/healthz`, `/v1/healthz/`): liveness
//! - `GET /readyz`: readiness, probes the store

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::error::{ApiError, McpError};
use crate::identity::IdentityProvider;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::server::McpServer;

/// Shared state for every route.
pub struct HttpTransportState {
    pub server: McpServer,
    pub identity: Arc<dyn IdentityProvider>,
    /// Reported by the liveness endpoints.
    pub service_name: String,
    pub keepalive_interval: Duration,
}

impl HttpTransportState {
    pub fn new(server: McpServer, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            server,
            identity,
            service_name: "tablegate".to_string(),
            keepalive_interval: Duration::from_secs(15),
        }
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<HttpTransportState>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp_post).get(handle_mcp_stream))
        .route("/v1/execute", post(handle_execute))
        .route("/healthz", get(handle_health).post(handle_health))
        .route("/healthz/", get(handle_health).post(handle_health))
        .route("/v1/healthz", get(handle_health).post(handle_health))
        .route("/v1/healthz/", get(handle_health).post(handle_health))
        .route("/readyz", get(handle_ready))
        .with_state(state)
}

/// Bind `addr` and serve `router` until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), McpError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| McpError::StartupFailed(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!(addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Handle POST requests to /mcp (JSON-RPC over HTTP).
async fn handle_mcp_post(
    State(state): State<Arc<HttpTransportState>>,
    headers: HeaderMap,
    body: Result<Json<JsonRpcRequest>, JsonRejection>,
) -> Response {
    let principal = match state.identity.principal(&headers).await {
        Ok(principal) => principal,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let response = JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                format!("Parse error: {}", rejection.body_text()),
            );
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    Json(state.server.handle_request(&principal, request).await).into_response()
}

/// Handle GET requests to /mcp: one `connected` comment, then axum's
/// keep-alive emits a `keepalive` comment per idle interval. No data events are
/// ever sent.
async fn handle_mcp_stream(State(state): State<Arc<HttpTransportState>>) -> impl IntoResponse {
    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Event::default().comment("connected"));
        futures::future::pending::<()>().await;
    };
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.keepalive_interval)
            .text("keepalive"),
    )
}

/// Handle POST requests to /v1/execute.
async fn handle_execute(
    State(state): State<Arc<HttpTransportState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let principal = state.identity.principal(&headers).await?;
    let Json(arguments) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let result = state
        .server
        .gateway()
        .execute_value(&principal, arguments)
        .await?;

    Ok(Json(json!({ "principal": principal, "result": result })))
}

async fn handle_health(State(state): State<Arc<HttpTransportState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn handle_ready(State(state): State<Arc<HttpTransportState>>) -> Response {
    match state.server.gateway().ready().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "detail": e.to_string() })),
            )
                .into_response()
        }
    }
}
