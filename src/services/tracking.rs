// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Append-only parcel event history.

use crate::db::Store;
use crate::error::AppError;
use crate::ids::new_document_id;
use crate::models::{TrackingLog, TrackingStatus};
use crate::time_utils::now_rfc3339;
use std::sync::Arc;

#[derive(Clone)]
pub struct TrackingLogger {
    store: Arc<dyn Store>,
}

impl TrackingLogger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record a lifecycle event. Failures are logged, never returned.
    pub async fn log(&self, tracking_id: &str, status: TrackingStatus) {
        if let Err(e) = self.append(tracking_id, status).await {
            tracing::warn!(
                tracking_id,
                status = status.as_str(),
                error = %e,
                "Failed to append tracking log"
            );
        }
    }

    async fn append(&self, tracking_id: &str, status: TrackingStatus) -> Result<(), AppError> {
        let entry = TrackingLog {
            id: new_document_id()?,
            tracking_id: tracking_id.to_string(),
            status,
            details: status.details(),
            created_at: now_rfc3339(),
        };
        self.store.append_tracking(&entry).await?;
        tracing::debug!(tracking_id, status = status.as_str(), "Appended tracking log");
        Ok(())
    }

    /// All events for a tracking id, oldest first.
    pub async fn history(&self, tracking_id: &str) -> Result<Vec<TrackingLog>, AppError> {
        self.store.list_trackings(tracking_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn history_is_in_append_order() {
        let logger = TrackingLogger::new(Arc::new(MemoryStore::new()));
        logger
            .log("PRCL-20260101-000001", TrackingStatus::ParcelCreated)
            .await;
        logger
            .log("PRCL-20260101-000001", TrackingStatus::ParcelPaid)
            .await;
        logger
            .log("PRCL-20260101-000002", TrackingStatus::ParcelCreated)
            .await;

        let history = logger.history("PRCL-20260101-000001").await.unwrap();
        let statuses: Vec<_> = history.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            [TrackingStatus::ParcelCreated, TrackingStatus::ParcelPaid]
        );
        assert_eq!(history[1].details, "parcel paid");
    }
}
