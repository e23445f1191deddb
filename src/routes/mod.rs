// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod parcels;
pub mod payments;
pub mod riders;
pub mod trackings;
pub mod users;

use crate::error::AppError;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

async fn banner() -> &'static str {
    "Zap Shift Server is Running"
}

/// Treat `?key=` the same as an absent key.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional query value into one of the serde-named status enums.
pub(crate) fn parse_query_enum<T: DeserializeOwned>(
    field: &str,
    value: Option<String>,
) -> Result<Option<T>, AppError> {
    non_empty(value)
        .map(|raw| {
            serde_json::from_value(serde_json::Value::String(raw.clone()))
                .map_err(|_| AppError::BadRequest(format!("invalid {}: {}", field, raw)))
        })
        .transpose()
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from the site and localhost (for dev)
    let site_domain = state.config.site_domain.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == site_domain
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Guards are attached per endpoint inside each module
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
        .merge(parcels::routes())
        .merge(payments::routes(state.clone()))
        .merge(riders::routes(state.clone()))
        .merge(users::routes(state.clone()))
        .merge(trackings::routes())
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeliveryStatus;

    #[test]
    fn empty_query_values_are_absent() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" x ".to_string())).as_deref(), Some("x"));
    }

    #[test]
    fn query_enums_use_wire_names() {
        let parsed: Option<DeliveryStatus> =
            parse_query_enum("deliveryStatus", Some("pending-pickup".to_string())).unwrap();
        assert_eq!(parsed, Some(DeliveryStatus::PendingPickup));

        let err = parse_query_enum::<DeliveryStatus>("deliveryStatus", Some("lost".to_string()));
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }
}
