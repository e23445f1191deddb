// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider seam: bearer token in, verified email out.

use async_trait::async_trait;

/// Principal extracted from a verified ID token.
#[derive(Debug, Clone)]
pub struct VerifiedPrincipal {
    pub email: String,
    pub subject: String,
}

/// Token verification error categories.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OidcError {
    /// The token is invalid or its claims do not match expectations.
    #[error("token rejected: {0}")]
    Rejected(String),
    /// Signing keys could not be fetched.
    #[error("identity provider unavailable: {0}")]
    Transient(String),
}

/// Verifies bearer credentials against an external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifiedPrincipal, OidcError>;
}
