// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stripe Checkout client.
//!
//! Talks to the REST API directly with form-encoded bodies:
//! - `POST /v1/checkout/sessions` to open a hosted payment page
//! - `GET /v1/checkout/sessions/{id}` to read back payment status

use super::payments::{CheckoutRequest, CheckoutSession, PaymentGateway, SessionDetails};
use crate::error::AppError;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Stripe HTTP client")?;

        Ok(Self {
            http,
            base_url: "https://api.stripe.com/v1".to_string(),
            secret_key,
        })
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Stripe rate limit hit (429)");
            }

            return Err(AppError::PaymentGateway(format!(
                "HTTP {}: {}",
                status,
                stripe_error_message(&body).unwrap_or(body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Failed to parse response: {}", e)))
    }
}

/// Form fields for a one-item payment-mode checkout session.
fn checkout_form(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    vec![
        (
            "line_items[0][price_data][currency]",
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            request.amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            format!("Please pay for: {}", request.metadata.parcel_name),
        ),
        ("line_items[0][quantity]", "1".to_string()),
        ("mode", "payment".to_string()),
        ("customer_email", request.customer_email.clone()),
        ("metadata[parcelId]", request.metadata.parcel_id.clone()),
        ("metadata[parcelName]", request.metadata.parcel_name.clone()),
        ("metadata[trackingId]", request.metadata.tracking_id.clone()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
    ]
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

fn stripe_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AppError> {
        let url = format!("{}/checkout/sessions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&checkout_form(request))
            .send()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Create session request failed: {}", e)))?;

        let session: CheckoutSession = self.check_response_json(response).await?;
        tracing::info!(
            session_id = %session.id,
            parcel_id = %request.metadata.parcel_id,
            "Created Stripe checkout session"
        );
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, AppError> {
        let url = format!(
            "{}/checkout/sessions/{}",
            self.base_url,
            urlencoding::encode(session_id)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                AppError::PaymentGateway(format!("Retrieve session request failed: {}", e))
            })?;

        self.check_response_json(response).await
    }
}
