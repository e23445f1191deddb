// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory implementation of [`Store`].
//!
//! Not durable: all state is lost on process restart. Every collection lives
//! behind one `RwLock`, so [`Store::commit`] is atomic by holding the write
//! lock across its precondition checks and all of its writes. Documents are kept in insertion order,
//! which breaks timestamp ties in listings.

use super::{Mutation, ParcelQuery, Precondition, RiderQuery, Store};
use crate::error::AppError;
use crate::models::{Parcel, Payment, Rider, TrackingLog, User};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    parcels: Vec<Parcel>,
    payments: Vec<Payment>,
    riders: Vec<Rider>,
    trackings: Vec<TrackingLog>,
}

/// Store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Replace the document with the same id, or append a new one.
fn put<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter_mut().find(|existing| same(existing, &item)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

/// Newest first; later inserts win timestamp ties.
fn newest_first<T>(
    items: impl DoubleEndedIterator<Item = T>,
    key: impl Fn(&T) -> String,
) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by_key(|item| std::cmp::Reverse(key(item)));
    out
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user_if_absent(&self, user: &User) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Ok(false);
        }
        inner.users.push(user.clone());
        Ok(true)
    }

    async fn search_users(&self, needle: &str, limit: usize) -> Result<Vec<User>, AppError> {
        let inner = self.inner.read().await;
        let matching = inner
            .users
            .iter()
            .filter(|u| u.matches_search(needle))
            .cloned();
        let mut users = newest_first(matching, |u| u.created_at.clone());
        users.truncate(limit);
        Ok(users)
    }

    async fn get_parcel(&self, id: &str) -> Result<Option<Parcel>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.parcels.iter().find(|p| p.id == id).cloned())
    }

    async fn list_parcels(&self, query: &ParcelQuery) -> Result<Vec<Parcel>, AppError> {
        let inner = self.inner.read().await;
        let matching = inner.parcels.iter().filter(|p| query.matches(p)).cloned();
        Ok(newest_first(matching, |p| p.created_at.clone()))
    }

    async fn insert_parcel(&self, parcel: &Parcel) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if inner.parcels.iter().any(|p| p.id == parcel.id) {
            return Err(AppError::Conflict(format!("parcel {} already exists", parcel.id)));
        }
        inner.parcels.push(parcel.clone());
        Ok(())
    }

    async fn delete_parcel(&self, id: &str) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let before = inner.parcels.len();
        inner.parcels.retain(|p| p.id != id);
        Ok(inner.parcels.len() != before)
    }

    async fn find_payment(&self, transaction_id: &str) -> Result<Option<Payment>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .iter()
            .find(|p| p.transaction_id == transaction_id)
            .cloned())
    }

    async fn list_payments(&self, customer_email: &str) -> Result<Vec<Payment>, AppError> {
        let inner = self.inner.read().await;
        let matching = inner
            .payments
            .iter()
            .filter(|p| p.customer_email == customer_email)
            .cloned();
        Ok(newest_first(matching, |p| p.paid_at.clone()))
    }

    async fn get_rider(&self, id: &str) -> Result<Option<Rider>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.riders.iter().find(|r| r.id == id).cloned())
    }

    async fn list_riders(&self, query: &RiderQuery) -> Result<Vec<Rider>, AppError> {
        let inner = self.inner.read().await;
        let matching = inner.riders.iter().filter(|r| query.matches(r)).cloned();
        Ok(newest_first(matching, |r| r.created_at.clone()))
    }

    async fn insert_rider(&self, rider: &Rider) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if inner.riders.iter().any(|r| r.id == rider.id) {
            return Err(AppError::Conflict(format!("rider {} already exists", rider.id)));
        }
        inner.riders.push(rider.clone());
        Ok(())
    }

    async fn append_tracking(&self, entry: &TrackingLog) -> Result<(), AppError> {
        self.inner.write().await.trackings.push(entry.clone());
        Ok(())
    }

    async fn list_trackings(&self, tracking_id: &str) -> Result<Vec<TrackingLog>, AppError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<TrackingLog> = inner
            .trackings
            .iter()
            .filter(|t| t.tracking_id == tracking_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    async fn commit(
        &self,
        preconditions: Vec<Precondition>,
        mutations: Vec<Mutation>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;

        for precondition in &preconditions {
            let holds = match precondition {
                Precondition::Parcel { id, .. } => {
                    precondition.holds_for_parcel(inner.parcels.iter().find(|p| &p.id == id))
                }
                Precondition::Rider { id, .. } => {
                    precondition.holds_for_rider(inner.riders.iter().find(|r| &r.id == id))
                }
                Precondition::PaymentAbsent { transaction_id } => !inner
                    .payments
                    .iter()
                    .any(|p| &p.transaction_id == transaction_id),
            };
            if !holds {
                return Err(precondition.violation());
            }
        }

        for mutation in mutations {
            match mutation {
                Mutation::PutParcel(parcel) => put(&mut inner.parcels, parcel, |a, b| a.id == b.id),
                Mutation::PutRider(rider) => put(&mut inner.riders, rider, |a, b| a.id == b.id),
                Mutation::PutUser(user) => put(&mut inner.users, user, |a, b| a.id == b.id),
                Mutation::PutPayment(payment) => put(&mut inner.payments, payment, |a, b| {
                    a.transaction_id == b.transaction_id
                }),
            }
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
