// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Zap Shift API Server
//!
//! Parcel booking, payment and delivery tracking backend.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zap_shift::{
    config::{Config, StoreBackend},
    db::{FirestoreStore, MemoryStore, Store},
    services::{FirebaseTokenVerifier, StripeClient},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Zap Shift API");

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreStore::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!(backend = store.backend_name(), "Store initialized");

    let payments = Arc::new(StripeClient::new(config.stripe_secret_key.clone())?);
    let identity = Arc::new(FirebaseTokenVerifier::new(&config)?);

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, payments, identity));

    // Build router
    let app = zap_shift::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("zap_shift=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .try_init()?;
    Ok(())
}
