// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use zap_shift::config::Config;
use zap_shift::db::{FirestoreStore, MemoryStore, Store};
use zap_shift::error::AppError;
use zap_shift::models::{Parcel, User, UserRole};
use zap_shift::routes::create_router;
use zap_shift::services::{
    CheckoutRequest, CheckoutSession, IdentityProvider, OidcError, PaymentGateway,
    SessionDetails, SessionMetadata, VerifiedPrincipal,
};
use zap_shift::AppState;

/// Token the fake identity provider treats as an outage.
#[allow(dead_code)]
pub const UNAVAILABLE_TOKEN: &str = "identity-provider-down";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Identity provider that accepts tokens registered with [`FakeIdentity::token_for`].
#[derive(Default)]
pub struct FakeIdentity {
    tokens: Mutex<HashMap<String, String>>,
}

impl FakeIdentity {
    /// Bearer token that authenticates as `email`.
    pub fn token_for(&self, email: &str) -> String {
        let token = format!("token-{email}");
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), email.to_string());
        token
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify_token(&self, token: &str) -> Result<VerifiedPrincipal, OidcError> {
        if token == UNAVAILABLE_TOKEN {
            return Err(OidcError::Transient("JWKS fetch failed".to_string()));
        }
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .map(|email| VerifiedPrincipal {
                email: email.clone(),
                subject: format!("uid-{email}"),
            })
            .ok_or_else(|| OidcError::Rejected("unknown token".to_string()))
    }
}

/// Gateway that serves pre-registered sessions and records created ones.
#[derive(Default)]
pub struct FakeGateway {
    sessions: Mutex<HashMap<String, SessionDetails>>,
    pub created: Mutex<Vec<CheckoutRequest>>,
}

impl FakeGateway {
    /// Register a session for `parcel` with the given gateway payment status.
    #[allow(dead_code)]
    pub fn add_session(&self, session_id: &str, parcel: &Parcel, payment_status: &str) {
        let session = SessionDetails {
            id: session_id.to_string(),
            payment_status: payment_status.to_string(),
            amount_total: Some(parcel.cost_in_cents()),
            currency: Some("usd".to_string()),
            customer_email: Some(parcel.sender_email.clone()),
            payment_intent: Some(format!("pi_{session_id}")),
            metadata: SessionMetadata {
                parcel_id: parcel.id.clone(),
                parcel_name: parcel.parcel_name.clone(),
                tracking_id: parcel.tracking_id.clone(),
            },
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), session);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AppError> {
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        let id = format!("cs_test_{}", created.len());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/pay/{id}"),
            id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, AppError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::PaymentGateway(format!("No such checkout.session: {session_id}")))
    }
}

/// App wired to in-memory fakes.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub identity: Arc<FakeIdentity>,
}

/// Create a test app over [`MemoryStore`] and fake external services.
pub fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(FakeGateway::default());
    let identity = Arc::new(FakeIdentity::default());

    let state = Arc::new(AppState::new(
        Config::test_default(),
        store.clone(),
        gateway.clone(),
        identity.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        gateway,
        identity,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Send a request; `token` becomes a bearer credential.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Send a request and decode the JSON response, asserting the status.
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
        expected: StatusCode,
    ) -> serde_json::Value {
        let response = self.send(method, uri, token, body).await;
        let status = response.status();
        let json = body_json(response).await;
        assert_eq!(status, expected, "{method} {uri}: {json}");
        json
    }

    /// Insert a user with a given role straight into the store.
    pub async fn seed_user(&self, email: &str, role: UserRole) -> User {
        let user = User {
            id: format!("user-{email}"),
            email: email.to_string(),
            display_name: email.split('@').next().unwrap_or_default().to_string(),
            photo_url: None,
            role,
            created_at: zap_shift::time_utils::now_rfc3339(),
        };
        assert!(self.store.insert_user_if_absent(&user).await.unwrap());
        user
    }

    /// Bearer token for a seeded admin.
    pub async fn admin_token(&self) -> String {
        self.seed_user("admin@zapshift.test", UserRole::Admin).await;
        self.identity.token_for("admin@zapshift.test")
    }

    /// Book a parcel through the API and return the stored document.
    pub async fn create_parcel(&self, sender: &str, cost: f64) -> Parcel {
        let json = self
            .send_json(
                "POST",
                "/parcels",
                None,
                Some(serde_json::json!({
                    "senderEmail": sender,
                    "senderName": "Sender",
                    "parcelName": "Documents",
                    "parcelType": "document",
                    "receiverName": "Receiver",
                    "receiverDistrict": "Dhaka",
                    "cost": cost,
                })),
                StatusCode::OK,
            )
            .await;
        let id = json["inserted"].as_str().unwrap();
        self.store.get_parcel(id).await.unwrap().unwrap()
    }

    /// Book a parcel and confirm a paid checkout session for it.
    pub async fn create_paid_parcel(&self, sender: &str) -> Parcel {
        let parcel = self.create_parcel(sender, 25.0).await;
        let session_id = format!("cs_{}", parcel.id);
        self.gateway.add_session(&session_id, &parcel, "paid");
        self.send_json(
            "PATCH",
            &format!("/payment-success?session_id={session_id}"),
            None,
            None,
            StatusCode::OK,
        )
        .await;
        self.store.get_parcel(&parcel.id).await.unwrap().unwrap()
    }

    /// Submit a rider application and approve it as admin.
    pub async fn approved_rider(&self, email: &str, admin_token: &str) -> String {
        let json = self
            .send_json(
                "POST",
                "/riders",
                None,
                Some(serde_json::json!({
                    "name": "Rider",
                    "email": email,
                    "district": "Dhaka",
                    "region": "Dhaka",
                    "bikeModel": "Honda CB",
                })),
                StatusCode::OK,
            )
            .await;
        let rider_id = json["inserted"].as_str().unwrap().to_string();

        self.send_json(
            "PATCH",
            &format!("/riders/{rider_id}"),
            Some(admin_token),
            Some(serde_json::json!({"status": "approved"})),
            StatusCode::OK,
        )
        .await;
        rider_id
    }
}

/// Read a response body as JSON (`null` for an empty body).
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
    })
}
