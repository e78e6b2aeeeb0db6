//! Parking ingest service
//!
//! Wires the ParkWatch pipeline to its transports: the MQTT subscriber feeds
//! sensor messages in, the HTTP API serves the snapshot and accepts manual
//! overrides, and capacity alerts leave through a webhook.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub mod alert;
pub mod config;
pub mod handlers;
pub mod liveness;
pub mod state;
pub mod subscriber;

pub use state::AppState;

/// HTTP routes of the read/override API
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/data", get(handlers::get_data))
        .route("/api/admin/reset", post(handlers::admin_reset))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}
