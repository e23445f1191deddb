// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account and role routes.

use crate::db::Mutation;
use crate::error::{AppError, Result};
use crate::ids::new_document_id;
use crate::middleware::auth::{require_admin, require_auth};
use crate::models::{User, UserRole};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Upper bound on user search results.
pub const USER_SEARCH_LIMIT: usize = 6;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let authenticated = || middleware::from_fn_with_state(state.clone(), require_auth);
    let admin = || middleware::from_fn_with_state(state.clone(), require_admin);

    // Same-path routes with different guards are separate method routers
    Router::new()
        .route("/zap_users", post(create_user))
        .route(
            "/zap_users",
            get(search_users).route_layer(authenticated()),
        )
        .route(
            "/zap_users/{id}",
            patch(update_role)
                .route_layer(admin())
                .route_layer(authenticated()),
        )
        .route("/zap_users/{id}/role", get(get_role))
        .route(
            "/zap_users/{id}/role",
            patch(update_role)
                .route_layer(admin())
                .route_layer(authenticated()),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    search_text: Option<String>,
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<User>>> {
    let needle = params
        .search_text
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    Ok(Json(
        state.store.search_users(&needle, USER_SEARCH_LIMIT).await?,
    ))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoleResponse {
    pub role: UserRole,
}

/// Role for an email. Unknown emails are plain users.
async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<RoleResponse>> {
    let role = state
        .store
        .find_user_by_email(&email)
        .await?
        .map(|u| u.role)
        .unwrap_or_default();
    Ok(Json(RoleResponse { role }))
}

/// Sign-up record written after the client authenticates.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    #[validate(url)]
    pub photo_url: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(untagged)]
pub enum CreateUserResponse {
    Exists { message: String },
    Created { success: bool, inserted: String },
}

/// Create the account for an email once; later calls are no-ops.
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>> {
    body.validate()?;

    let user = User {
        id: new_document_id()?,
        email: body.email,
        display_name: body.display_name.unwrap_or_default(),
        photo_url: body.photo_url,
        role: UserRole::User,
        created_at: now_rfc3339(),
    };

    if !state.store.insert_user_if_absent(&user).await? {
        tracing::debug!(email = %user.email, "User already exists");
        return Ok(Json(CreateUserResponse::Exists {
            message: "user exists".to_string(),
        }));
    }

    tracing::info!(user_id = %user.id, email = %user.email, "User created");
    Ok(Json(CreateUserResponse::Created {
        success: true,
        inserted: user.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub modified_count: u64,
}

async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<UpdateRoleResponse>> {
    let mut user = state
        .store
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;

    let previous = user.role;
    user.role = body.role;
    state
        .store
        .commit(Vec::new(), vec![Mutation::PutUser(user)])
        .await?;

    tracing::info!(
        user_id = %id,
        from = previous.as_str(),
        to = body.role.as_str(),
        "User role changed"
    );
    Ok(Json(UpdateRoleResponse { modified_count: 1 }))
}
