// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Zap Shift: backend for a parcel-delivery marketplace.
//!
//! Senders book and pay for parcels, admins vet rider applications and
//! assign approved riders, and every lifecycle step lands in a public
//! tracking history.

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{IdentityProvider, ParcelLifecycle, PaymentGateway};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentGateway>,
    pub identity: Arc<dyn IdentityProvider>,
    pub lifecycle: ParcelLifecycle,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentGateway>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let lifecycle = ParcelLifecycle::new(store.clone(), payments.clone());
        Self {
            config,
            store,
            payments,
            identity,
            lifecycle,
        }
    }
}
