// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public parcel tracking.

use crate::error::Result;
use crate::models::TrackingLog;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/trackings/{tracking_id}/logs", get(tracking_logs))
}

/// Event history for a tracking id, oldest first. Unknown ids yield `[]`.
async fn tracking_logs(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
) -> Result<Json<Vec<TrackingLog>>> {
    Ok(Json(
        state.lifecycle.tracking().history(&tracking_id).await?,
    ))
}
