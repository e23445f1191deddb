// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers and services talk to the [`Store`] trait. [`FirestoreStore`] is
//! the production backend; [`MemoryStore`] backs local development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{
    DeliveryStatus, Parcel, Payment, PaymentStatus, Rider, RiderStatus, TrackingLog, User,
    WorkStatus,
};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PARCELS: &str = "parcels";
    pub const PAYMENTS: &str = "payments";
    pub const RIDERS: &str = "riders";
    pub const TRACKINGS: &str = "trackings";
}

/// Filter for parcel listings. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ParcelQuery {
    pub sender_email: Option<String>,
    pub rider_email: Option<String>,
    pub delivery_status: Option<DeliveryStatus>,
    /// Drop delivered parcels (a rider's active assignments)
    pub exclude_delivered: bool,
}

impl ParcelQuery {
    pub fn matches(&self, parcel: &Parcel) -> bool {
        self.sender_email
            .as_deref()
            .is_none_or(|email| parcel.sender_email == email)
            && self
                .rider_email
                .as_deref()
                .is_none_or(|email| parcel.rider_email.as_deref() == Some(email))
            && self
                .delivery_status
                .is_none_or(|status| parcel.delivery_status == status)
            && !(self.exclude_delivered
                && parcel.delivery_status == DeliveryStatus::ParcelDelivered)
    }
}

/// Filter for rider listings. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RiderQuery {
    pub status: Option<RiderStatus>,
    pub district: Option<String>,
    pub work_status: Option<WorkStatus>,
}

impl RiderQuery {
    pub fn matches(&self, rider: &Rider) -> bool {
        self.status.is_none_or(|status| rider.status == status)
            && self
                .district
                .as_deref()
                .is_none_or(|district| rider.district == district)
            && self
                .work_status
                .is_none_or(|work_status| rider.work_status == work_status)
    }
}

/// A full-document write applied by [`Store::commit`].
#[derive(Debug, Clone)]
pub enum Mutation {
    PutParcel(Parcel),
    PutRider(Rider),
    PutUser(User),
    /// Keyed by transaction id, so replays overwrite rather than duplicate.
    PutPayment(Payment),
}

/// State a [`Store::commit`] must observe before any of its writes land.
///
/// Services read documents, decide, then commit; preconditions pin the state
/// that decision was made on so a concurrent change aborts the commit with
/// [`AppError::Conflict`] instead of being overwritten.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// The parcel exists with these statuses.
    Parcel {
        id: String,
        delivery_status: DeliveryStatus,
        payment_status: PaymentStatus,
    },
    /// The rider exists with these statuses.
    Rider {
        id: String,
        status: RiderStatus,
        work_status: WorkStatus,
    },
    /// No payment has been recorded under this transaction id.
    PaymentAbsent { transaction_id: String },
}

impl Precondition {
    pub fn parcel(parcel: &Parcel) -> Self {
        Self::Parcel {
            id: parcel.id.clone(),
            delivery_status: parcel.delivery_status,
            payment_status: parcel.payment_status,
        }
    }

    pub fn rider(rider: &Rider) -> Self {
        Self::Rider {
            id: rider.id.clone(),
            status: rider.status,
            work_status: rider.work_status,
        }
    }

    /// Check against the current parcel document, if any.
    pub fn holds_for_parcel(&self, current: Option<&Parcel>) -> bool {
        match self {
            Self::Parcel {
                delivery_status,
                payment_status,
                ..
            } => current.is_some_and(|p| {
                p.delivery_status == *delivery_status && p.payment_status == *payment_status
            }),
            _ => true,
        }
    }

    /// Check against the current rider document, if any.
    pub fn holds_for_rider(&self, current: Option<&Rider>) -> bool {
        match self {
            Self::Rider {
                status,
                work_status,
                ..
            } => current.is_some_and(|r| r.status == *status && r.work_status == *work_status),
            _ => true,
        }
    }

    pub fn violation(&self) -> AppError {
        AppError::Conflict(match self {
            Self::Parcel { id, .. } => format!("parcel {} changed concurrently", id),
            Self::Rider { id, .. } => format!("rider {} changed concurrently", id),
            Self::PaymentAbsent { transaction_id } => {
                format!("payment {} already recorded", transaction_id)
            }
        })
    }
}

/// Typed access to the document collections.
///
/// Listings are newest first unless documented otherwise.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert `user` unless a user with the same email exists.
    ///
    /// Returns `false` when the email was already taken.
    async fn insert_user_if_absent(&self, user: &User) -> Result<bool, AppError>;

    /// Users whose name or email contains `needle` (lowercase), at most `limit`.
    async fn search_users(&self, needle: &str, limit: usize) -> Result<Vec<User>, AppError>;

    // ─── Parcels ─────────────────────────────────────────────────

    async fn get_parcel(&self, id: &str) -> Result<Option<Parcel>, AppError>;

    async fn list_parcels(&self, query: &ParcelQuery) -> Result<Vec<Parcel>, AppError>;

    async fn insert_parcel(&self, parcel: &Parcel) -> Result<(), AppError>;

    /// Returns `false` if no parcel had this id.
    async fn delete_parcel(&self, id: &str) -> Result<bool, AppError>;

    // ─── Payments ────────────────────────────────────────────────

    async fn find_payment(&self, transaction_id: &str) -> Result<Option<Payment>, AppError>;

    /// Newest first by `paidAt`.
    async fn list_payments(&self, customer_email: &str) -> Result<Vec<Payment>, AppError>;

    // ─── Riders ──────────────────────────────────────────────────

    async fn get_rider(&self, id: &str) -> Result<Option<Rider>, AppError>;

    async fn list_riders(&self, query: &RiderQuery) -> Result<Vec<Rider>, AppError>;

    async fn insert_rider(&self, rider: &Rider) -> Result<(), AppError>;

    // ─── Tracking Log ────────────────────────────────────────────

    async fn append_tracking(&self, entry: &TrackingLog) -> Result<(), AppError>;

    /// Oldest first.
    async fn list_trackings(&self, tracking_id: &str) -> Result<Vec<TrackingLog>, AppError>;

    // ─── Multi-collection writes ─────────────────────────────────

    /// Apply all mutations atomically: either every write lands or none do.
    ///
    /// Every precondition is checked in the same atomic section as the
    /// writes; a failed one returns [`AppError::Conflict`] and writes nothing.
    async fn commit(
        &self,
        preconditions: Vec<Precondition>,
        mutations: Vec<Mutation>,
    ) -> Result<(), AppError>;

    fn backend_name(&self) -> &'static str;
}
