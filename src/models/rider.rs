// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rider application and availability model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Review state of a rider application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum RiderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RiderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RiderStatus::Pending => "pending",
            RiderStatus::Approved => "approved",
            RiderStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    Available,
    InDelivery,
}

impl WorkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkStatus::Available => "available",
            WorkStatus::InDelivery => "in_delivery",
        }
    }
}

/// Rider document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Rider {
    /// Document ID
    pub id: String,
    pub name: String,
    pub email: String,
    pub district: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// National ID number
    #[serde(default)]
    pub nid: Option<String>,
    #[serde(default)]
    pub bike_model: Option<String>,
    #[serde(default)]
    pub bike_registration: Option<String>,
    #[serde(default)]
    pub status: RiderStatus,
    #[serde(default)]
    pub work_status: WorkStatus,
    pub created_at: String,
}

impl Rider {
    /// Approved and not currently carrying a parcel.
    pub fn can_take_assignment(&self) -> bool {
        self.status == RiderStatus::Approved && self.work_status == WorkStatus::Available
    }
}
