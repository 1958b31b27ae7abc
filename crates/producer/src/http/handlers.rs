//! HTTP route handlers
//!
//! # Endpoints
//!
//! - `GET /location` - last location published by this producer
//! - `PUT /location` - replay the configured route onto the topic
//! - `GET /health` - status and replay counters

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fleet_protocol::Location;
use serde::Serialize;
use tracing::error;

use crate::error::ProducerError;
use crate::publisher::Publisher;
use crate::route::RouteSpec;

/// Shared state for handlers
pub struct HandlerState {
    pub publisher: Arc<Publisher>,
    /// Route replayed by `PUT /location`
    pub route: RouteSpec,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub location: Location,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: &'static str,
    pub published: usize,
}

/// GET /location - Last published location (the seed before any replay)
pub async fn get_location(State(state): State<Arc<HandlerState>>) -> Json<LocationResponse> {
    Json(LocationResponse {
        location: state.publisher.last_known_position(),
    })
}

/// PUT /location - Replay the default route
///
/// Responds once the replay has finished. The replay runs on its own task,
/// so a client that hangs up does not cut it short.
pub async fn update_location(State(state): State<Arc<HandlerState>>) -> Response {
    match state.publisher.spawn_replay(state.route.clone()).await {
        Ok(Ok(report)) => (
            StatusCode::OK,
            Json(UpdateResponse {
                message: "Location Updated",
                published: report.published,
            }),
        )
            .into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            error!(error = %e, "route replay task failed");
            ProducerError::internal(e.to_string()).into_response()
        }
    }
}

/// GET /health - Health check
pub async fn health_check(State(state): State<Arc<HandlerState>>) -> impl IntoResponse {
    let publisher = &state.publisher;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "topic": publisher.topic().as_str(),
            "replaying": publisher.is_replaying(),
            "location": publisher.last_known_position(),
            "metrics": publisher.metrics(),
        })),
    )
}
