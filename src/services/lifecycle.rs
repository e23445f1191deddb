// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parcel lifecycle coordinator.
//!
//! Every state change of a parcel goes through here so that the parcel,
//! rider and payment documents move together and each change appends one
//! tracking event:
//!
//! ```text
//! parcel_created ─pay─▶ pending-pickup ─assign─▶ driver_assigned
//!     ─report─▶ rider_arriving ─▶ parcel_picked_up ─▶ parcel_delivered
//! ```
//!
//! Reports may skip intermediate states but never move backwards.
//!
//! Decisions are made on documents read up front; each commit carries the
//! statuses those decisions relied on as [`Precondition`]s, so a concurrent
//! change turns into a conflict rather than a lost update.

use super::payments::{CheckoutRequest, CheckoutSession, PaymentGateway, SessionMetadata};
use super::tracking::TrackingLogger;
use crate::db::{Mutation, Precondition, Store};
use crate::error::AppError;
use crate::ids::{new_document_id, new_tracking_id};
use crate::models::{
    DeliveryStatus, Parcel, Payment, PaymentStatus, TrackingStatus, WorkStatus,
};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const CHECKOUT_CURRENCY: &str = "usd";

/// Sender-supplied fields of a new parcel.
#[derive(Debug, Clone, Default)]
pub struct NewParcel {
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub sender_district: Option<String>,
    pub parcel_name: String,
    pub parcel_type: Option<String>,
    pub parcel_weight: Option<f64>,
    pub receiver_name: Option<String>,
    pub receiver_email: Option<String>,
    pub receiver_phone: Option<String>,
    pub receiver_address: Option<String>,
    pub receiver_district: Option<String>,
    pub cost: f64,
}

/// Outcome of confirming a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub success: bool,
    /// The transaction had been confirmed before; nothing was written
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl PaymentConfirmation {
    fn unpaid() -> Self {
        Self {
            success: false,
            already_recorded: false,
            tracking_id: None,
            transaction_id: None,
        }
    }
}

#[derive(Clone)]
pub struct ParcelLifecycle {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    tracking: TrackingLogger,
}

impl ParcelLifecycle {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
        let tracking = TrackingLogger::new(store.clone());
        Self {
            store,
            gateway,
            tracking,
        }
    }

    pub fn tracking(&self) -> &TrackingLogger {
        &self.tracking
    }

    async fn load_parcel(&self, parcel_id: &str) -> Result<Parcel, AppError> {
        self.store
            .get_parcel(parcel_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("parcel {}", parcel_id)))
    }

    /// Insert a new unpaid parcel with a fresh tracking id.
    pub async fn create_parcel(&self, new: NewParcel) -> Result<Parcel, AppError> {
        let now = Utc::now();
        let parcel = Parcel {
            id: new_document_id()?,
            tracking_id: new_tracking_id(now)?,
            sender_email: new.sender_email,
            sender_name: new.sender_name,
            sender_district: new.sender_district,
            parcel_name: new.parcel_name,
            parcel_type: new.parcel_type,
            parcel_weight: new.parcel_weight,
            receiver_name: new.receiver_name,
            receiver_email: new.receiver_email,
            receiver_phone: new.receiver_phone,
            receiver_address: new.receiver_address,
            receiver_district: new.receiver_district,
            cost: new.cost,
            delivery_status: DeliveryStatus::ParcelCreated,
            payment_status: PaymentStatus::Unpaid,
            rider_id: None,
            rider_name: None,
            rider_email: None,
            created_at: format_utc_rfc3339(now),
            paid_at: None,
        };

        self.store.insert_parcel(&parcel).await?;
        tracing::info!(
            parcel_id = %parcel.id,
            tracking_id = %parcel.tracking_id,
            "Parcel created"
        );

        self.tracking
            .log(&parcel.tracking_id, TrackingStatus::ParcelCreated)
            .await;
        Ok(parcel)
    }

    /// Open a hosted checkout page priced from the stored parcel.
    pub async fn start_checkout(
        &self,
        parcel_id: &str,
        site_domain: &str,
    ) -> Result<CheckoutSession, AppError> {
        let parcel = self.load_parcel(parcel_id).await?;
        if parcel.is_paid() {
            return Err(AppError::Conflict(format!(
                "parcel {} is already paid",
                parcel.id
            )));
        }

        let request = CheckoutRequest {
            amount_cents: parcel.cost_in_cents(),
            currency: CHECKOUT_CURRENCY.to_string(),
            customer_email: parcel.sender_email.clone(),
            metadata: SessionMetadata {
                parcel_id: parcel.id.clone(),
                parcel_name: parcel.parcel_name.clone(),
                tracking_id: parcel.tracking_id.clone(),
            },
            success_url: format!(
                "{}/dashboard/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
                site_domain
            ),
            cancel_url: format!("{}/dashboard/payment-cancelled", site_domain),
        };

        self.gateway.create_checkout_session(&request).await
    }

    /// The confirmation for a transaction that was already recorded, if any.
    async fn recorded_confirmation(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentConfirmation>, AppError> {
        let Some(existing) = self.store.find_payment(transaction_id).await? else {
            return Ok(None);
        };
        tracing::debug!(
            transaction_id,
            tracking_id = %existing.tracking_id,
            "Payment already recorded"
        );
        Ok(Some(PaymentConfirmation {
            success: true,
            already_recorded: true,
            tracking_id: Some(existing.tracking_id),
            transaction_id: Some(transaction_id.to_string()),
        }))
    }

    /// Record a completed checkout. Safe to call repeatedly for one session.
    pub async fn confirm_payment(&self, session_id: &str) -> Result<PaymentConfirmation, AppError> {
        let session = self.gateway.retrieve_session(session_id).await?;
        let transaction_id = session.transaction_id().to_string();

        if let Some(confirmation) = self.recorded_confirmation(&transaction_id).await? {
            return Ok(confirmation);
        }

        if !session.is_paid() {
            tracing::info!(
                session_id,
                payment_status = %session.payment_status,
                "Checkout session not paid"
            );
            return Ok(PaymentConfirmation::unpaid());
        }

        let mut parcel = self.load_parcel(&session.metadata.parcel_id).await?;
        let observed = Precondition::parcel(&parcel);
        let paid_at = now_rfc3339();

        parcel.payment_status = PaymentStatus::Paid;
        parcel.paid_at = Some(paid_at.clone());
        if parcel.delivery_status == DeliveryStatus::ParcelCreated {
            parcel.delivery_status = DeliveryStatus::PendingPickup;
        }

        let payment = Payment {
            amount: session.amount(),
            currency: session
                .currency
                .clone()
                .unwrap_or_else(|| CHECKOUT_CURRENCY.to_string()),
            customer_email: session
                .customer_email
                .clone()
                .unwrap_or_else(|| parcel.sender_email.clone()),
            parcel_id: parcel.id.clone(),
            parcel_name: parcel.parcel_name.clone(),
            transaction_id: transaction_id.clone(),
            payment_status: session.payment_status.clone(),
            paid_at,
            tracking_id: parcel.tracking_id.clone(),
        };

        let tracking_id = parcel.tracking_id.clone();
        let committed = self
            .store
            .commit(
                vec![
                    Precondition::PaymentAbsent {
                        transaction_id: transaction_id.clone(),
                    },
                    observed,
                ],
                vec![Mutation::PutParcel(parcel), Mutation::PutPayment(payment)],
            )
            .await;

        if let Err(AppError::Conflict(_)) = &committed {
            // Lost a race with another confirmation of the same session
            if let Some(confirmation) = self.recorded_confirmation(&transaction_id).await? {
                return Ok(confirmation);
            }
        }
        committed?;

        tracing::info!(
            transaction_id = %transaction_id,
            tracking_id = %tracking_id,
            "Payment recorded"
        );
        self.tracking
            .log(&tracking_id, TrackingStatus::ParcelPaid)
            .await;

        Ok(PaymentConfirmation {
            success: true,
            already_recorded: false,
            tracking_id: Some(tracking_id),
            transaction_id: Some(transaction_id),
        })
    }

    /// Hand a paid parcel to an approved, available rider.
    pub async fn assign_rider(&self, parcel_id: &str, rider_id: &str) -> Result<Parcel, AppError> {
        let mut parcel = self.load_parcel(parcel_id).await?;
        let mut rider = self
            .store
            .get_rider(rider_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("rider {}", rider_id)))?;

        if parcel.delivery_status != DeliveryStatus::PendingPickup {
            return Err(AppError::Conflict(format!(
                "parcel {} is {}, expected {}",
                parcel.id,
                parcel.delivery_status,
                DeliveryStatus::PendingPickup
            )));
        }
        if !rider.can_take_assignment() {
            return Err(AppError::Conflict(format!(
                "rider {} is {} and {}",
                rider.id,
                rider.status.as_str(),
                rider.work_status.as_str()
            )));
        }

        let observed = vec![Precondition::parcel(&parcel), Precondition::rider(&rider)];
        parcel.rider_id = Some(rider.id.clone());
        parcel.rider_name = Some(rider.name.clone());
        parcel.rider_email = Some(rider.email.clone());
        parcel.delivery_status = DeliveryStatus::DriverAssigned;
        rider.work_status = WorkStatus::InDelivery;

        self.store
            .commit(
                observed,
                vec![
                    Mutation::PutParcel(parcel.clone()),
                    Mutation::PutRider(rider),
                ],
            )
            .await?;

        tracing::info!(
            parcel_id = %parcel.id,
            rider_id,
            tracking_id = %parcel.tracking_id,
            "Rider assigned"
        );
        self.tracking
            .log(&parcel.tracking_id, TrackingStatus::DriverAssigned)
            .await;
        Ok(parcel)
    }

    /// Apply a rider's progress report. Delivery frees the rider again.
    pub async fn update_delivery_status(
        &self,
        parcel_id: &str,
        next: DeliveryStatus,
    ) -> Result<Parcel, AppError> {
        let mut parcel = self.load_parcel(parcel_id).await?;

        if !parcel.delivery_status.can_report(next) {
            return Err(AppError::Conflict(format!(
                "cannot move parcel {} from {} to {}",
                parcel.id, parcel.delivery_status, next
            )));
        }

        let mut preconditions = vec![Precondition::parcel(&parcel)];
        parcel.delivery_status = next;
        let mut mutations = Vec::with_capacity(2);

        if next == DeliveryStatus::ParcelDelivered {
            if let Some(rider_id) = parcel.rider_id.as_deref() {
                match self.store.get_rider(rider_id).await? {
                    Some(mut rider) => {
                        preconditions.push(Precondition::rider(&rider));
                        rider.work_status = WorkStatus::Available;
                        mutations.push(Mutation::PutRider(rider));
                    }
                    None => {
                        tracing::warn!(
                            parcel_id = %parcel.id,
                            rider_id,
                            "Assigned rider no longer exists"
                        );
                    }
                }
            }
        }
        mutations.insert(0, Mutation::PutParcel(parcel.clone()));

        self.store.commit(preconditions, mutations).await?;

        tracing::info!(
            parcel_id = %parcel.id,
            tracking_id = %parcel.tracking_id,
            status = %next,
            "Delivery status updated"
        );
        self.tracking
            .log(&parcel.tracking_id, TrackingStatus::from(next))
            .await;
        Ok(parcel)
    }

    /// Remove a parcel. Returns the number of deleted documents.
    pub async fn delete_parcel(&self, parcel_id: &str) -> Result<u64, AppError> {
        let deleted = self.store.delete_parcel(parcel_id).await?;
        if deleted {
            tracing::info!(parcel_id, "Parcel deleted");
        }
        Ok(u64::from(deleted))
    }
}
