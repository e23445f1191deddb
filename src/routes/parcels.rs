// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parcel booking, listing and lifecycle routes.

use super::{non_empty, parse_query_enum};
use crate::db::ParcelQuery;
use crate::error::{AppError, Result};
use crate::models::{DeliveryStatus, Parcel};
use crate::services::NewParcel;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parcels", get(list_parcels).post(create_parcel))
        .route("/parcels/rider", get(list_rider_parcels))
        .route(
            "/parcels/{id}",
            get(get_parcel).patch(assign_rider).delete(delete_parcel),
        )
        .route("/parcels/{id}/status", patch(update_status))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelListParams {
    email: Option<String>,
    delivery_status: Option<String>,
}

/// Sender's parcels, or every parcel when no email is given.
async fn list_parcels(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ParcelListParams>,
) -> Result<Json<Vec<Parcel>>> {
    let query = ParcelQuery {
        sender_email: non_empty(params.email),
        delivery_status: parse_query_enum("deliveryStatus", params.delivery_status)?,
        ..Default::default()
    };
    Ok(Json(state.store.list_parcels(&query).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderParcelParams {
    rider_email: Option<String>,
    delivery_status: Option<String>,
}

/// A rider's finished deliveries, or their active assignments otherwise.
async fn list_rider_parcels(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RiderParcelParams>,
) -> Result<Json<Vec<Parcel>>> {
    let rider_email = non_empty(params.rider_email)
        .ok_or_else(|| AppError::BadRequest("riderEmail is required".to_string()))?;

    let status: Option<DeliveryStatus> =
        parse_query_enum("deliveryStatus", params.delivery_status)?;
    let delivered = status == Some(DeliveryStatus::ParcelDelivered);

    let query = ParcelQuery {
        rider_email: Some(rider_email),
        delivery_status: delivered.then_some(DeliveryStatus::ParcelDelivered),
        exclude_delivered: !delivered,
        ..Default::default()
    };
    Ok(Json(state.store.list_parcels(&query).await?))
}

async fn get_parcel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Parcel>> {
    state
        .store
        .get_parcel(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("parcel {}", id)))
}

// ─── Booking ─────────────────────────────────────────────────

/// New parcel body. Status, payment and tracking fields are server-assigned.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateParcelRequest {
    #[validate(email)]
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub sender_district: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub parcel_name: String,
    pub parcel_type: Option<String>,
    #[validate(range(min = 0.0))]
    pub parcel_weight: Option<f64>,
    pub receiver_name: Option<String>,
    #[validate(email)]
    pub receiver_email: Option<String>,
    pub receiver_phone: Option<String>,
    pub receiver_address: Option<String>,
    pub receiver_district: Option<String>,
    #[validate(range(min = 0.0))]
    pub cost: f64,
}

impl From<CreateParcelRequest> for NewParcel {
    fn from(req: CreateParcelRequest) -> Self {
        NewParcel {
            sender_email: req.sender_email,
            sender_name: req.sender_name,
            sender_district: req.sender_district,
            parcel_name: req.parcel_name,
            parcel_type: req.parcel_type,
            parcel_weight: req.parcel_weight,
            receiver_name: req.receiver_name,
            receiver_email: req.receiver_email,
            receiver_phone: req.receiver_phone,
            receiver_address: req.receiver_address,
            receiver_district: req.receiver_district,
            cost: req.cost,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CreateParcelResponse {
    pub success: bool,
    pub tracking_id: String,
    /// Id of the new parcel document
    pub inserted: String,
}

async fn create_parcel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateParcelRequest>,
) -> Result<Json<CreateParcelResponse>> {
    body.validate()?;
    let parcel = state.lifecycle.create_parcel(body.into()).await?;

    Ok(Json(CreateParcelResponse {
        success: true,
        tracking_id: parcel.tracking_id,
        inserted: parcel.id,
    }))
}

// ─── Lifecycle ───────────────────────────────────────────────

/// Rider assignment body.
///
/// `riderName` and `riderEmail` are accepted from older clients but the
/// stored rider record is authoritative.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRiderRequest {
    #[validate(length(min = 1))]
    pub rider_id: String,
    pub rider_name: Option<String>,
    pub rider_email: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ParcelUpdateResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub modified_count: u64,
    pub delivery_status: DeliveryStatus,
}

async fn assign_rider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AssignRiderRequest>,
) -> Result<Json<ParcelUpdateResponse>> {
    body.validate()?;
    let parcel = state.lifecycle.assign_rider(&id, &body.rider_id).await?;

    Ok(Json(ParcelUpdateResponse {
        modified_count: 1,
        delivery_status: parcel.delivery_status,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub delivery_status: DeliveryStatus,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ParcelUpdateResponse>> {
    let parcel = state
        .lifecycle
        .update_delivery_status(&id, body.delivery_status)
        .await?;

    Ok(Json(ParcelUpdateResponse {
        modified_count: 1,
        delivery_status: parcel.delivery_status,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub deleted_count: u64,
}

async fn delete_parcel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted_count = state.lifecycle.delete_parcel(&id).await?;
    Ok(Json(DeleteResponse { deleted_count }))
}
