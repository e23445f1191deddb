// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parcel model and its delivery lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Delivery status, declared in lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DeliveryStatus {
    /// Created, awaiting payment
    #[serde(rename = "parcel_created")]
    ParcelCreated,
    /// Paid, awaiting a rider
    #[serde(rename = "pending-pickup")]
    PendingPickup,
    #[serde(rename = "driver_assigned")]
    DriverAssigned,
    #[serde(rename = "rider_arriving")]
    RiderArriving,
    #[serde(rename = "parcel_picked_up")]
    ParcelPickedUp,
    /// Terminal
    #[serde(rename = "parcel_delivered")]
    ParcelDelivered,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::ParcelCreated => "parcel_created",
            DeliveryStatus::PendingPickup => "pending-pickup",
            DeliveryStatus::DriverAssigned => "driver_assigned",
            DeliveryStatus::RiderArriving => "rider_arriving",
            DeliveryStatus::ParcelPickedUp => "parcel_picked_up",
            DeliveryStatus::ParcelDelivered => "parcel_delivered",
        }
    }

    /// Statuses a rider or staff member may report directly.
    ///
    /// `pending-pickup` is only reached through payment and
    /// `driver_assigned` only through rider assignment.
    pub fn is_reportable(self) -> bool {
        matches!(
            self,
            DeliveryStatus::RiderArriving
                | DeliveryStatus::ParcelPickedUp
                | DeliveryStatus::ParcelDelivered
        )
    }

    /// Whether a status report may move a parcel from `self` to `next`.
    ///
    /// Reports only move forward, and only once a rider is assigned.
    pub fn can_report(self, next: DeliveryStatus) -> bool {
        next.is_reportable() && self >= DeliveryStatus::DriverAssigned && next > self
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// Parcel document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    /// Document ID
    pub id: String,
    /// Assigned once at creation, never changed
    pub tracking_id: String,
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_district: Option<String>,
    pub parcel_name: String,
    /// "document" or "non-document" in the current frontend
    #[serde(default)]
    pub parcel_type: Option<String>,
    /// Weight in kilograms
    #[serde(default)]
    pub parcel_weight: Option<f64>,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub receiver_email: Option<String>,
    #[serde(default)]
    pub receiver_phone: Option<String>,
    #[serde(default)]
    pub receiver_address: Option<String>,
    #[serde(default)]
    pub receiver_district: Option<String>,
    /// Delivery cost in USD
    pub cost: f64,
    pub delivery_status: DeliveryStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub rider_id: Option<String>,
    #[serde(default)]
    pub rider_name: Option<String>,
    #[serde(default)]
    pub rider_email: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub paid_at: Option<String>,
}

impl Parcel {
    /// Gateway amount in minor units (cents).
    pub fn cost_in_cents(&self) -> i64 {
        (self.cost * 100.0).round() as i64
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeliveryStatus::*;

    #[test]
    fn wire_names_match_frontend() {
        assert_eq!(
            serde_json::to_string(&PendingPickup).unwrap(),
            "\"pending-pickup\""
        );
        assert_eq!(
            serde_json::from_str::<DeliveryStatus>("\"driver_assigned\"").unwrap(),
            DriverAssigned
        );
        assert!(serde_json::from_str::<DeliveryStatus>("\"lost_in_transit\"").is_err());
    }

    #[test]
    fn reports_only_move_forward_after_assignment() {
        assert!(DriverAssigned.can_report(RiderArriving));
        assert!(DriverAssigned.can_report(ParcelDelivered));
        assert!(RiderArriving.can_report(ParcelPickedUp));

        assert!(!PendingPickup.can_report(RiderArriving));
        assert!(!ParcelCreated.can_report(ParcelDelivered));
        assert!(!ParcelPickedUp.can_report(RiderArriving));
        assert!(!ParcelDelivered.can_report(ParcelDelivered));
        assert!(!DriverAssigned.can_report(DriverAssigned));
    }

    #[test]
    fn cost_rounds_to_cents() {
        let json = serde_json::json!({
            "id": "p1",
            "trackingId": "PRCL-20260101-ABCDEF",
            "senderEmail": "s@example.com",
            "parcelName": "Books",
            "cost": 19.99,
            "deliveryStatus": "parcel_created",
            "createdAt": "2026-01-01T00:00:00.000Z"
        });
        let parcel: Parcel = serde_json::from_value(json).unwrap();
        assert_eq!(parcel.cost_in_cents(), 1999);
        assert!(!parcel.is_paid());
    }
}
