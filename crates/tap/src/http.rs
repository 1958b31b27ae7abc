//! Consumer HTTP API
//!
//! # Endpoints
//!
//! - `GET /location` - consumer-side pull query, always `200`
//! - `GET /health` - status, listener and delivery counters
//!
//! A handler that panics is answered with `200` and the processing-failure
//! payload, the same body a pull reports for any other internal fault.

use std::any::Any;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use fleet_config::ConsumerConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::broadcaster::LiveBroadcaster;
use crate::error::{Result, TapError};
use crate::pull::PullResponse;
use crate::subscriber::SubscriberMetrics;

/// Shared state for handlers
pub struct HandlerState {
    pub broadcaster: Arc<LiveBroadcaster>,
    pub subscriber: Arc<SubscriberMetrics>,
}

/// Consumer HTTP server
pub struct ConsumerServer {
    address: String,
    state: Arc<HandlerState>,
}

impl ConsumerServer {
    /// Create a consumer API server
    pub fn new(
        config: &ConsumerConfig,
        broadcaster: Arc<LiveBroadcaster>,
        subscriber: Arc<SubscriberMetrics>,
    ) -> Self {
        Self {
            address: config.bind_address(),
            state: Arc::new(HandlerState {
                broadcaster,
                subscriber,
            }),
        }
    }

    /// Run until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(&self.address)
            .await
            .map_err(|e| TapError::Bind {
                address: self.address.clone(),
                source: e,
            })?;

        info!(address = %self.address, "consumer API listening");

        let result = axum::serve(listener, router(Arc::clone(&self.state)))
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .map_err(|e| TapError::Http(e.to_string()));

        info!("consumer API stopped");
        result
    }
}

/// Build the router with fault handling, request tracing and permissive CORS
pub fn router(state: Arc<HandlerState>) -> Router {
    catch_handler_faults(build_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
}

/// Turn handler panics into the processing-failure payload
fn catch_handler_faults(router: Router) -> Router {
    router.layer(CatchPanicLayer::custom(fault_response))
}

fn fault_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(error = detail, "consumer API handler panicked");

    json_ok(PullResponse::failed().to_json())
}

fn json_ok(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Build the axum router
fn build_router(state: Arc<HandlerState>) -> Router {
    Router::new()
        .route("/location", get(get_location))
        .route("/health", get(health_check))
        .with_state(state)
}

/// GET /location - Latest delivered location
///
/// Failures are reported in the body, never as an HTTP error status.
async fn get_location(State(state): State<Arc<HandlerState>>) -> Response {
    json_ok(state.broadcaster.pull().to_json())
}

/// GET /health - Health check
async fn health_check(State(state): State<Arc<HandlerState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "listeners": state.broadcaster.listener_count(),
            "broadcast": state.broadcaster.stats(),
            "subscriber": state.subscriber.snapshot(),
        })),
    )
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
