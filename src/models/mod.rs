// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod parcel;
pub mod payment;
pub mod rider;
pub mod tracking;
pub mod user;

pub use parcel::{DeliveryStatus, Parcel, PaymentStatus};
pub use payment::Payment;
pub use rider::{Rider, RiderStatus, WorkStatus};
pub use tracking::{TrackingLog, TrackingStatus};
pub use user::{User, UserRole};
