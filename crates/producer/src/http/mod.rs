//! Producer HTTP API
//!
//! Serves the producer-side pull query and the replay trigger.
//!
//! # Example
//!
//! ```ignore
//! let server = ProducerServer::new(&config.producer, publisher, route);
//! server.run(cancel_token).await?;
//! ```

mod error;
mod handlers;

#[cfg(test)]
mod http_test;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use fleet_config::ProducerConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ErrorBody, ServerError};
pub use handlers::{HandlerState, LocationResponse, UpdateResponse};

use handlers::{get_location, health_check, update_location};

use crate::publisher::Publisher;
use crate::route::RouteSpec;

/// Producer HTTP server
pub struct ProducerServer {
    address: String,
    cors_origin: String,
    state: Arc<HandlerState>,
}

impl ProducerServer {
    /// Create a server replaying `route` on `PUT /location`
    pub fn new(config: &ProducerConfig, publisher: Arc<Publisher>, route: RouteSpec) -> Self {
        Self {
            address: config.bind_address(),
            cors_origin: config.cors_origin.clone(),
            state: Arc::new(HandlerState { publisher, route }),
        }
    }

    /// Run until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let app = router(Arc::clone(&self.state), &self.cors_origin)?;

        let listener =
            TcpListener::bind(&self.address)
                .await
                .map_err(|e| ServerError::Bind {
                    address: self.address.clone(),
                    source: e,
                })?;

        info!(
            address = %self.address,
            topic = %self.state.publisher.topic(),
            "producer API listening"
        );

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .map_err(|e| ServerError::Http(e.to_string()));

        info!("producer API stopped");
        result
    }
}

/// Build the router with request tracing and CORS for `cors_origin`
pub fn router(state: Arc<HandlerState>, cors_origin: &str) -> Result<Router, ServerError> {
    let origin = HeaderValue::from_str(cors_origin)
        .map_err(|_| ServerError::InvalidOrigin(cors_origin.to_string()))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers(Any);

    Ok(build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

/// Build the axum router
fn build_router(state: Arc<HandlerState>) -> Router {
    Router::new()
        .route("/location", get(get_location).put(update_location))
        .route("/health", get(health_check))
        .with_state(state)
}
