// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rider application routes.

use super::{non_empty, parse_query_enum};
use crate::db::RiderQuery;
use crate::error::Result;
use crate::ids::new_document_id;
use crate::middleware::auth::{require_admin, require_auth};
use crate::models::{Rider, RiderStatus, WorkStatus};
use crate::services::{review_application, RiderReview};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/riders", get(list_riders).post(apply))
        .route(
            "/riders/{id}",
            patch(review)
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
                .route_layer(middleware::from_fn_with_state(state, require_auth)),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderListParams {
    status: Option<String>,
    district: Option<String>,
    work_status: Option<String>,
}

async fn list_riders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RiderListParams>,
) -> Result<Json<Vec<Rider>>> {
    let query = RiderQuery {
        status: parse_query_enum("status", params.status)?,
        district: non_empty(params.district),
        work_status: parse_query_enum("workStatus", params.work_status)?,
    };
    Ok(Json(state.store.list_riders(&query).await?))
}

/// Rider application form.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RiderApplication {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub district: String,
    pub region: Option<String>,
    pub phone: Option<String>,
    pub nid: Option<String>,
    pub bike_model: Option<String>,
    pub bike_registration: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RiderApplicationResponse {
    pub success: bool,
    pub inserted: String,
}

/// Submit an application. Review state is always server-assigned.
async fn apply(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RiderApplication>,
) -> Result<Json<RiderApplicationResponse>> {
    body.validate()?;

    let rider = Rider {
        id: new_document_id()?,
        name: body.name,
        email: body.email,
        district: body.district,
        region: body.region,
        phone: body.phone,
        nid: body.nid,
        bike_model: body.bike_model,
        bike_registration: body.bike_registration,
        status: RiderStatus::Pending,
        work_status: WorkStatus::Available,
        created_at: now_rfc3339(),
    };
    state.store.insert_rider(&rider).await?;

    tracing::info!(rider_id = %rider.id, district = %rider.district, "Rider application received");

    Ok(Json(RiderApplicationResponse {
        success: true,
        inserted: rider.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub status: RiderStatus,
}

async fn review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<RiderReview>> {
    let review = review_application(state.store.as_ref(), &id, body.status).await?;
    Ok(Json(review))
}
