// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment gateway seam: hosted checkout sessions.

use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;

/// Everything needed to open a hosted checkout page for one parcel.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Amount in minor units (cents)
    pub amount_cents: i64,
    pub currency: String,
    pub customer_email: String,
    pub metadata: SessionMetadata,
    pub success_url: String,
    pub cancel_url: String,
}

/// Identifiers attached to a session and echoed back on retrieval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMetadata {
    #[serde(default, rename = "parcelId")]
    pub parcel_id: String,
    #[serde(default, rename = "parcelName")]
    pub parcel_name: String,
    #[serde(default, rename = "trackingId")]
    pub tracking_id: String,
}

/// A freshly created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Session state as reported by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetails {
    pub id: String,
    pub payment_status: String,
    /// Minor units
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

impl SessionDetails {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// Stable id of the money movement: the payment intent, else the session.
    pub fn transaction_id(&self) -> &str {
        self.payment_intent
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.id)
    }

    /// Charged amount in major units.
    pub fn amount(&self) -> f64 {
        self.amount_total.unwrap_or_default() as f64 / 100.0
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AppError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, AppError>;
}
