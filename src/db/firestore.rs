// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore implementation of [`Store`].
//!
//! Collections:
//! - `users`, `parcels`, `riders`, `trackings` keyed by random document ids
//! - `payments` keyed by gateway transaction id
//!
//! Listing queries combine equality filters with an `order_by` on a
//! timestamp field, which needs the matching composite indexes.

use super::{collections, Mutation, ParcelQuery, Precondition, RiderQuery, Store};
use crate::error::AppError;
use crate::models::{Parcel, Payment, Rider, TrackingLog, User};
use async_trait::async_trait;
use firestore::FirestoreQueryDirection::{Ascending, Descending};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any token; skip credential discovery entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    fn client(&self) -> &firestore::FirestoreDb {
        &self.client
    }

    async fn put_document<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Sync + Send,
    {
        let _: () = self
            .client()
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_document<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.client()
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl Store for FirestoreStore {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_document(collections::USERS, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .client()
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn insert_user_if_absent(&self, user: &User) -> Result<bool, AppError> {
        // Not transactional: two first sign-ins racing can both insert.
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Ok(false);
        }
        self.put_document(collections::USERS, &user.id, user).await?;
        Ok(true)
    }

    async fn search_users(&self, needle: &str, limit: usize) -> Result<Vec<User>, AppError> {
        let query = self
            .client()
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("createdAt", Descending)]);

        // Firestore has no substring match, so searches scan and filter here.
        let users: Vec<User> = if needle.is_empty() {
            query
                .limit(u32::try_from(limit).unwrap_or(u32::MAX))
                .obj::<User>()
                .query()
                .await
        } else {
            query.obj::<User>().query().await
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users
            .into_iter()
            .filter(|u| u.matches_search(needle))
            .take(limit)
            .collect())
    }

    // ─── Parcel Operations ───────────────────────────────────────

    async fn get_parcel(&self, id: &str) -> Result<Option<Parcel>, AppError> {
        self.get_document(collections::PARCELS, id).await
    }

    async fn list_parcels(&self, query: &ParcelQuery) -> Result<Vec<Parcel>, AppError> {
        let sender = query.sender_email.clone();
        let rider = query.rider_email.clone();
        let status = query.delivery_status.map(|s| s.as_str());

        let parcels: Vec<Parcel> = self
            .client()
            .fluent()
            .select()
            .from(collections::PARCELS)
            .filter(move |q| {
                q.for_all([
                    sender
                        .clone()
                        .and_then(|email| q.field("senderEmail").eq(email)),
                    rider
                        .clone()
                        .and_then(|email| q.field("riderEmail").eq(email)),
                    status.and_then(|s| q.field("deliveryStatus").eq(s)),
                ])
            })
            .order_by([("createdAt", Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Inequality on deliveryStatus would force it into the ordering, so
        // exclusion is applied here.
        Ok(parcels.into_iter().filter(|p| query.matches(p)).collect())
    }

    async fn insert_parcel(&self, parcel: &Parcel) -> Result<(), AppError> {
        self.put_document(collections::PARCELS, &parcel.id, parcel)
            .await
    }

    async fn delete_parcel(&self, id: &str) -> Result<bool, AppError> {
        if self.get_parcel(id).await?.is_none() {
            return Ok(false);
        }

        self.client()
            .fluent()
            .delete()
            .from(collections::PARCELS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    // ─── Payment Operations ──────────────────────────────────────

    async fn find_payment(&self, transaction_id: &str) -> Result<Option<Payment>, AppError> {
        self.get_document(collections::PAYMENTS, transaction_id)
            .await
    }

    async fn list_payments(&self, customer_email: &str) -> Result<Vec<Payment>, AppError> {
        let email = customer_email.to_string();
        self.client()
            .fluent()
            .select()
            .from(collections::PAYMENTS)
            .filter(move |q| q.for_all([q.field("customerEmail").eq(email.clone())]))
            .order_by([("paidAt", Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Rider Operations ────────────────────────────────────────

    async fn get_rider(&self, id: &str) -> Result<Option<Rider>, AppError> {
        self.get_document(collections::RIDERS, id).await
    }

    async fn list_riders(&self, query: &RiderQuery) -> Result<Vec<Rider>, AppError> {
        let status = query.status.map(|s| s.as_str());
        let district = query.district.clone();
        let work_status = query.work_status.map(|w| w.as_str());

        self.client()
            .fluent()
            .select()
            .from(collections::RIDERS)
            .filter(move |q| {
                q.for_all([
                    status.and_then(|s| q.field("status").eq(s)),
                    district
                        .clone()
                        .and_then(|d| q.field("district").eq(d)),
                    work_status.and_then(|w| q.field("workStatus").eq(w)),
                ])
            })
            .order_by([("createdAt", Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_rider(&self, rider: &Rider) -> Result<(), AppError> {
        self.put_document(collections::RIDERS, &rider.id, rider).await
    }

    // ─── Tracking Log Operations ─────────────────────────────────

    async fn append_tracking(&self, entry: &TrackingLog) -> Result<(), AppError> {
        self.put_document(collections::TRACKINGS, &entry.id, entry)
            .await
    }

    async fn list_trackings(&self, tracking_id: &str) -> Result<Vec<TrackingLog>, AppError> {
        let tracking_id = tracking_id.to_string();
        self.client()
            .fluent()
            .select()
            .from(collections::TRACKINGS)
            .filter(move |q| q.for_all([q.field("trackingId").eq(tracking_id.clone())]))
            .order_by([("createdAt", Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Multi-Document Writes ────────────────────────────

    /// Check preconditions and write every mutation in a single Firestore
    /// transaction.
    ///
    /// Precondition documents are read through the transaction, so a
    /// concurrent write to any of them aborts the commit.
    async fn commit(
        &self,
        preconditions: Vec<Precondition>,
        mutations: Vec<Mutation>,
    ) -> Result<(), AppError> {
        let client = self.client();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let snapshot = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        for precondition in &preconditions {
            let holds = match precondition {
                Precondition::Parcel { id, .. } => {
                    let current: Option<Parcel> =
                        read_in_transaction(&snapshot, collections::PARCELS, id).await?;
                    precondition.holds_for_parcel(current.as_ref())
                }
                Precondition::Rider { id, .. } => {
                    let current: Option<Rider> =
                        read_in_transaction(&snapshot, collections::RIDERS, id).await?;
                    precondition.holds_for_rider(current.as_ref())
                }
                Precondition::PaymentAbsent { transaction_id } => {
                    let current: Option<Payment> =
                        read_in_transaction(&snapshot, collections::PAYMENTS, transaction_id)
                            .await?;
                    current.is_none()
                }
            };

            if !holds {
                tracing::debug!(?precondition, "Commit precondition failed");
                let _ = transaction.rollback().await;
                return Err(precondition.violation());
            }
        }

        for mutation in &mutations {
            let (collection, id) = match mutation {
                Mutation::PutParcel(p) => (collections::PARCELS, p.id.as_str()),
                Mutation::PutRider(r) => (collections::RIDERS, r.id.as_str()),
                Mutation::PutUser(u) => (collections::USERS, u.id.as_str()),
                Mutation::PutPayment(p) => (collections::PAYMENTS, p.transaction_id.as_str()),
            };

            let builder = client.fluent().update().in_col(collection).document_id(id);
            let added = match mutation {
                Mutation::PutParcel(p) => builder.object(p).add_to_transaction(&mut transaction),
                Mutation::PutRider(r) => builder.object(r).add_to_transaction(&mut transaction),
                Mutation::PutUser(u) => builder.object(u).add_to_transaction(&mut transaction),
                Mutation::PutPayment(p) => builder.object(p).add_to_transaction(&mut transaction),
            };

            added.map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} write to transaction: {}",
                    collection, e
                ))
            })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            checks = preconditions.len(),
            writes = mutations.len(),
            "Committed Firestore transaction"
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}

/// Read one document as part of the transaction `snapshot` is bound to.
async fn read_in_transaction<T>(
    snapshot: &firestore::FirestoreDb,
    collection: &str,
    id: &str,
) -> Result<Option<T>, AppError>
where
    T: for<'de> serde::Deserialize<'de> + Send,
{
    snapshot
        .fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(id)
        .await
        .map_err(|e| {
            AppError::Database(format!(
                "Failed to read {}/{} in transaction: {}",
                collection, id, e
            ))
        })
}
