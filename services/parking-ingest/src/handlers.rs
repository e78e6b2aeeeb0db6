use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use parkwatch_domain::{OverrideError, OverrideRequest, Snapshot};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// Current occupancy snapshot, verbatim.
pub async fn get_data(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.occupancy.snapshot())
}

/// Authenticated manual override of the served total.
pub async fn admin_reset(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OverrideRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected override with unreadable body");
            return failure(StatusCode::BAD_REQUEST, "Invalid request body.");
        }
    };

    match state.occupancy.apply_override(&request) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Counter updated successfully."
            })),
        ),
        Err(err @ OverrideError::Unauthorized) => {
            failure(StatusCode::UNAUTHORIZED, &err.to_string())
        }
        Err(err @ (OverrideError::MissingCount | OverrideError::InvalidCount(_))) => {
            failure(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "success": false,
            "message": message
        })),
    )
}

/// Liveness plus ingest counters and per-source continuity.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let metrics = state.occupancy.metrics();
    let sources: Vec<Value> = state
        .occupancy
        .continuity()
        .into_iter()
        .map(|source| {
            json!({
                "source": source.source,
                "role": source.role,
                "messages": source.messages,
                "chain_breaks": source.chain_breaks,
                "last_sequence": source.last_sequence,
            })
        })
        .collect();

    Json(json!({
        "status": "healthy",
        "service": "parking-ingest",
        "timestamp": Utc::now().to_rfc3339(),
        "ingest": metrics,
        "sources": sources,
    }))
}
