// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication ID token verification.
//!
//! Tokens are RS256 JWTs signed by Google's `securetoken` service account.
//! Signing keys are fetched from the published JWKS and cached for as long
//! as the response's `Cache-Control: max-age` allows.

use super::identity::{IdentityProvider, OidcError, VerifiedPrincipal};
use crate::config::Config;
use anyhow::Context;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase-issued ID tokens.
pub struct FirebaseTokenVerifier {
    http_client: reqwest::Client,
    project_id: String,
    issuer: String,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseTokenVerifier {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Firebase auth HTTP client")?;

        let project_id = config.firebase_project_id.clone();
        if project_id.trim().is_empty() {
            anyhow::bail!("Firebase project id must not be empty");
        }
        let issuer = format!("{ISSUER_PREFIX}{project_id}");

        tracing::info!(
            project = %project_id,
            issuer = %issuer,
            "Initialized Firebase ID token verifier"
        );

        Ok(Self {
            http_client,
            project_id,
            issuer,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, OidcError> {
        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate: a cache miss forces one refetch before giving up.
        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(OidcError::Rejected(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), OidcError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_uri = JWKS_URL, "Refreshing Firebase JWKS cache");

        let response = self
            .http_client
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| OidcError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OidcError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| OidcError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_rsa_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(OidcError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase JWKS cache refreshed");
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<VerifiedPrincipal, OidcError> {
        let header = decode_header(token)
            .map_err(|e| OidcError::Rejected(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(OidcError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| OidcError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<FirebaseIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| OidcError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        validate_claims(&claims, now_unix_secs())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseIdTokenClaims {
    sub: String,
    iat: Option<u64>,
    auth_time: Option<u64>,
    email: Option<String>,
    email_verified: Option<bool>,
}

fn usable_rsa_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            continue;
        }
        if jwk.use_.as_deref().is_some_and(|use_| use_ != "sig") {
            continue;
        }

        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
            }
        }
    }

    keys_by_kid
}

/// Checks Firebase requires beyond signature, issuer, audience and expiry.
fn validate_claims(claims: &FirebaseIdTokenClaims, now: u64) -> Result<VerifiedPrincipal, OidcError> {
    if claims.sub.is_empty() {
        return Err(OidcError::Rejected("empty sub claim".to_string()));
    }

    let Some(iat) = claims.iat else {
        return Err(OidcError::Rejected("missing iat claim".to_string()));
    };
    if iat > now + CLOCK_SKEW_SECS {
        return Err(OidcError::Rejected("iat claim is in the future".to_string()));
    }

    if claims
        .auth_time
        .is_some_and(|auth_time| auth_time > now + CLOCK_SKEW_SECS)
    {
        return Err(OidcError::Rejected(
            "auth_time claim is in the future".to_string(),
        ));
    }

    let email = claims
        .email
        .clone()
        .filter(|email| !email.is_empty())
        .ok_or_else(|| OidcError::Rejected("missing email claim".to_string()))?;

    if claims.email_verified == Some(false) {
        tracing::debug!(email = %email, "Accepting token with unverified email");
    }

    Ok(VerifiedPrincipal {
        email,
        subject: claims.sub.clone(),
    })
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")
            .and_then(|raw| raw.trim_matches('"').parse::<u64>().ok())
    })
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
