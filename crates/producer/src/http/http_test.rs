//! Producer HTTP API tests

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fleet_broker::{MemoryBroker, TopicName, TopicPublisher};
use fleet_protocol::{Coordinate, DEFAULT_SEED_LOCATION, Location};
use tower::ServiceExt;

use super::handlers::HandlerState;
use super::*;
use crate::route::{RouteSource, StaticRouteSource};

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn test_state(routes: Arc<dyn RouteSource>, broker: Arc<MemoryBroker>) -> Arc<HandlerState> {
    let broker: Arc<dyn TopicPublisher> = broker;
    let publisher = Arc::new(Publisher::new(
        routes,
        broker,
        TopicName::new("fleet-location"),
        Duration::from_millis(10),
        Location::new(DEFAULT_SEED_LOCATION),
    ));
    Arc::new(HandlerState {
        publisher,
        route: RouteSpec::new(coord(12.9784, 77.6408), coord(12.9308, 77.5839)),
    })
}

fn two_point_state() -> (Arc<HandlerState>, Arc<MemoryBroker>) {
    let broker = Arc::new(MemoryBroker::default());
    let routes = Arc::new(StaticRouteSource::new(vec![coord(1.0, 1.0), coord(2.0, 2.0)]));
    (test_state(routes, Arc::clone(&broker)), broker)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (state, _) = two_point_state();
    let app = build_router(state);

    let response = app.oneshot(request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["topic"], "fleet-location");
    assert_eq!(json["replaying"], false);
    assert_eq!(json["metrics"]["published"], 0);
}

// =============================================================================
// Location Tests
// =============================================================================

#[tokio::test]
async fn test_get_location_returns_seed() {
    let (state, _) = two_point_state();
    let app = build_router(state);

    let response = app.oneshot(request("GET", "/location")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["location"], "12.9784, 77.6408");
}

#[tokio::test]
async fn test_put_location_replays_route() {
    let (state, broker) = two_point_state();
    let app = build_router(Arc::clone(&state));

    let response = app.clone().oneshot(request("PUT", "/location")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Location Updated");
    assert_eq!(json["published"], 2);
    assert_eq!(broker.records(&TopicName::new("fleet-location")).len(), 2);

    let response = app.oneshot(request("GET", "/location")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["location"], "2,2");
}

#[tokio::test]
async fn test_put_location_route_failure() {
    let broker = Arc::new(MemoryBroker::default());
    let state = test_state(Arc::new(StaticRouteSource::new(Vec::new())), Arc::clone(&broker));
    let app = build_router(state);

    let response = app.oneshot(request("PUT", "/location")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Error getting route");
    assert_eq!(json["error"], "route is empty");
    assert!(json.get("published").is_none());
    assert!(broker.records(&TopicName::new("fleet-location")).is_empty());
}

#[tokio::test]
async fn test_put_location_broker_unavailable() {
    let (state, broker) = two_point_state();
    broker.set_available(false);
    let app = build_router(state);

    let response = app.oneshot(request("PUT", "/location")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Error publishing location");
    assert_eq!(json["published"], 0);
    assert!(json["error"].as_str().unwrap().contains("fleet-location"));
}

#[tokio::test]
async fn test_put_location_while_replaying_conflicts() {
    let broker = Arc::new(MemoryBroker::default());
    let routes = Arc::new(StaticRouteSource::new(vec![coord(1.0, 1.0); 50]));
    let state = test_state(routes, broker);
    let app = build_router(Arc::clone(&state));

    let running = state.publisher.spawn_replay(state.route.clone());
    while !state.publisher.is_replaying() {
        tokio::task::yield_now().await;
    }

    let response = app.oneshot(request("PUT", "/location")).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Route replay already in progress");
    assert!(json.get("error").is_none());

    running.abort();
}

// =============================================================================
// CORS Tests
// =============================================================================

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let (state, _) = two_point_state();
    let app = router(state, "http://localhost:3000").unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/location")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
}

#[test]
fn test_invalid_cors_origin() {
    let (state, _) = two_point_state();
    let result = router(state, "bad\norigin");
    assert!(matches!(result, Err(ServerError::InvalidOrigin(_))));
}
