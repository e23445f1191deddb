// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication and role guards.
//!
//! The guards are plain async functions so handlers and tests can call them
//! directly; `require_auth` and `require_admin` wrap them as axum middleware.
//! Stack `require_admin` inside `require_auth` (added first with
//! `route_layer`, so it runs second).

use crate::db::Store;
use crate::error::AppError;
use crate::models::UserRole;
use crate::services::{IdentityProvider, OidcError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Verify the bearer credential in `headers`.
pub async fn authenticate(
    identity: &dyn IdentityProvider,
    headers: &HeaderMap,
) -> Result<AuthUser, AppError> {
    let token = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;

    match identity.verify_token(token).await {
        Ok(principal) => {
            tracing::debug!(
                email = %principal.email,
                subject = %principal.subject,
                "Authenticated request"
            );
            Ok(AuthUser {
                email: principal.email,
            })
        }
        Err(OidcError::Rejected(reason)) => {
            tracing::warn!(reason = %reason, "Rejected bearer token");
            Err(AppError::Unauthorized)
        }
        Err(OidcError::Transient(reason)) => Err(AppError::IdentityProvider(reason)),
    }
}

/// The caller's stored role must be `admin`.
pub async fn authorize_admin(store: &dyn Store, user: &AuthUser) -> Result<(), AppError> {
    let role = store
        .find_user_by_email(&user.email)
        .await?
        .map(|u| u.role)
        .unwrap_or_default();

    if role != UserRole::Admin {
        tracing::warn!(email = %user.email, role = role.as_str(), "Admin access denied");
        return Err(AppError::Forbidden("admin role required".to_string()));
    }
    Ok(())
}

/// The caller may only act on their own email.
pub fn require_same_identity(user: &AuthUser, requested_email: &str) -> Result<(), AppError> {
    if user.email != requested_email {
        tracing::warn!(
            email = %user.email,
            requested = %requested_email,
            "Identity mismatch"
        );
        return Err(AppError::Forbidden(
            "cannot access another user's records".to_string(),
        ));
    }
    Ok(())
}

/// Middleware that requires a valid bearer token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(state.identity.as_ref(), request.headers()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware that requires an authenticated admin.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;
    authorize_admin(state.store.as_ref(), &user).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer_token(&headers("bearer xyz")), Some("xyz"));
    }

    #[test]
    fn malformed_authorization_is_ignored() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer")), None);
    }

    #[test]
    fn same_identity_compares_email() {
        let user = AuthUser {
            email: "me@example.com".to_string(),
        };
        assert!(require_same_identity(&user, "me@example.com").is_ok());
        assert!(matches!(
            require_same_identity(&user, "you@example.com"),
            Err(AppError::Forbidden(_))
        ));
    }
}
