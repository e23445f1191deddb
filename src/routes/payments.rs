// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout and payment history routes.

use super::non_empty;
use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, require_same_identity, AuthUser};
use crate::models::Payment;
use crate::services::PaymentConfirmation;
use crate::AppState;
use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/payment-checkout-session", post(create_checkout_session))
        .route("/payment-success", patch(confirm_payment))
        .route(
            "/payments",
            get(list_payments).route_layer(middleware::from_fn_with_state(state, require_auth)),
        )
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequestBody {
    #[validate(length(min = 1))]
    pub parcel_id: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckoutResponse {
    /// Hosted payment page to redirect the sender to
    pub url: String,
}

async fn create_checkout_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CheckoutRequestBody>,
) -> Result<Json<CheckoutResponse>> {
    body.validate()?;
    let session = state
        .lifecycle
        .start_checkout(&body.parcel_id, &state.config.site_domain)
        .await?;
    Ok(Json(CheckoutResponse { url: session.url }))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    session_id: Option<String>,
}

async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<PaymentConfirmation>> {
    let session_id = non_empty(params.session_id)
        .ok_or_else(|| AppError::BadRequest("session_id is required".to_string()))?;
    Ok(Json(state.lifecycle.confirm_payment(&session_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PaymentHistoryParams {
    email: Option<String>,
}

/// Caller's own payment history. Asking for someone else's is forbidden,
/// admins included.
async fn list_payments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PaymentHistoryParams>,
) -> Result<Json<Vec<Payment>>> {
    let email = non_empty(params.email).unwrap_or_else(|| user.email.clone());
    require_same_identity(&user, &email)?;
    Ok(Json(state.store.list_payments(&email).await?))
}
