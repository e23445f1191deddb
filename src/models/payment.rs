// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment record, one per confirmed checkout.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Payment document stored in Firestore.
///
/// The gateway transaction id doubles as the document id, so a transaction
/// can never be recorded twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Amount in major units (e.g. dollars)
    pub amount: f64,
    /// ISO currency code as reported by the gateway
    pub currency: String,
    pub customer_email: String,
    pub parcel_id: String,
    pub parcel_name: String,
    /// Gateway transaction id (idempotency key)
    pub transaction_id: String,
    /// Gateway-reported status, e.g. "paid"
    pub payment_status: String,
    pub paid_at: String,
    pub tracking_id: String,
}
