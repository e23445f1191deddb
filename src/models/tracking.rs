// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Append-only tracking log entries.

use crate::models::parcel::DeliveryStatus;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle event recorded in the tracking log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    ParcelCreated,
    ParcelPaid,
    DriverAssigned,
    RiderArriving,
    ParcelPickedUp,
    ParcelDelivered,
}

impl TrackingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingStatus::ParcelCreated => "parcel_created",
            TrackingStatus::ParcelPaid => "parcel_paid",
            TrackingStatus::DriverAssigned => "driver_assigned",
            TrackingStatus::RiderArriving => "rider_arriving",
            TrackingStatus::ParcelPickedUp => "parcel_picked_up",
            TrackingStatus::ParcelDelivered => "parcel_delivered",
        }
    }

    /// Display text: separators become spaces.
    pub fn details(self) -> String {
        self.as_str().replace(['_', '-'], " ")
    }
}

impl From<DeliveryStatus> for TrackingStatus {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::ParcelCreated => TrackingStatus::ParcelCreated,
            DeliveryStatus::PendingPickup => TrackingStatus::ParcelPaid,
            DeliveryStatus::DriverAssigned => TrackingStatus::DriverAssigned,
            DeliveryStatus::RiderArriving => TrackingStatus::RiderArriving,
            DeliveryStatus::ParcelPickedUp => TrackingStatus::ParcelPickedUp,
            DeliveryStatus::ParcelDelivered => TrackingStatus::ParcelDelivered,
        }
    }
}

/// Tracking log document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLog {
    /// Document ID
    pub id: String,
    pub tracking_id: String,
    pub status: TrackingStatus,
    pub details: String,
    pub created_at: String,
}
