// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic and external clients.

pub mod firebase_auth;
pub mod identity;
pub mod lifecycle;
pub mod payments;
pub mod riders;
pub mod stripe;
pub mod tracking;

pub use firebase_auth::FirebaseTokenVerifier;
pub use identity::{IdentityProvider, OidcError, VerifiedPrincipal};
pub use lifecycle::{NewParcel, ParcelLifecycle, PaymentConfirmation};
pub use payments::{
    CheckoutRequest, CheckoutSession, PaymentGateway, SessionDetails, SessionMetadata,
};
pub use riders::{review_application, RiderReview};
pub use stripe::StripeClient;
pub use tracking::TrackingLogger;
