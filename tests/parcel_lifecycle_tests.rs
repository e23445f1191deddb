// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parcel lifecycle tests, driven through the HTTP API.
//!
//! Covers booking, checkout, payment confirmation, rider assignment and
//! delivery reports, plus the tracking history each step leaves behind.

use axum::http::StatusCode;
use serde_json::json;
use zap_shift::db::{RiderQuery, Store};
use zap_shift::ids::is_tracking_id;
use zap_shift::models::{DeliveryStatus, PaymentStatus, WorkStatus};

mod common;
use common::create_test_app;

async fn tracking_statuses(app: &common::TestApp, tracking_id: &str) -> Vec<String> {
    let logs = app
        .send_json(
            "GET",
            &format!("/trackings/{tracking_id}/logs"),
            None,
            None,
            StatusCode::OK,
        )
        .await;
    logs.as_array()
        .unwrap()
        .iter()
        .map(|e| e["status"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_parcel_assigns_tracking_id() {
    let app = create_test_app();

    let json = app
        .send_json(
            "POST",
            "/parcels",
            None,
            Some(json!({
                "senderEmail": "sender@example.com",
                "parcelName": "Laptop",
                "cost": 150,
                // Client-supplied lifecycle fields are ignored
                "deliveryStatus": "parcel_delivered",
                "trackingId": "PRCL-19990101-000000",
            })),
            StatusCode::OK,
        )
        .await;

    assert_eq!(json["success"], true);
    let tracking_id = json["trackingId"].as_str().unwrap();
    assert!(is_tracking_id(tracking_id), "bad tracking id {tracking_id}");
    assert_ne!(tracking_id, "PRCL-19990101-000000");

    let parcel = app
        .store
        .get_parcel(json["inserted"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parcel.tracking_id, tracking_id);
    assert_eq!(parcel.delivery_status, DeliveryStatus::ParcelCreated);
    assert_eq!(parcel.payment_status, PaymentStatus::Unpaid);

    assert_eq!(tracking_statuses(&app, tracking_id).await, ["parcel_created"]);
}

#[tokio::test]
async fn test_tracking_id_survives_full_lifecycle() {
    let app = create_test_app();
    let admin = app.admin_token().await;

    let parcel = app.create_paid_parcel("sender@example.com").await;
    let original = parcel.tracking_id.clone();
    let rider_id = app.approved_rider("rider@example.com", &admin).await;

    app.send_json(
        "PATCH",
        &format!("/parcels/{}", parcel.id),
        None,
        Some(json!({"riderId": rider_id})),
        StatusCode::OK,
    )
    .await;
    for status in ["rider_arriving", "parcel_picked_up", "parcel_delivered"] {
        app.send_json(
            "PATCH",
            &format!("/parcels/{}/status", parcel.id),
            None,
            Some(json!({"deliveryStatus": status})),
            StatusCode::OK,
        )
        .await;
    }

    let fetched = app
        .send_json(
            "GET",
            &format!("/parcels/{}", parcel.id),
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(fetched["trackingId"], original.as_str());
    assert_eq!(fetched["deliveryStatus"], "parcel_delivered");

    assert_eq!(
        tracking_statuses(&app, &original).await,
        [
            "parcel_created",
            "parcel_paid",
            "driver_assigned",
            "rider_arriving",
            "parcel_picked_up",
            "parcel_delivered",
        ]
    );
}

#[tokio::test]
async fn test_checkout_session_uses_stored_parcel() {
    let app = create_test_app();
    let parcel = app.create_parcel("sender@example.com", 42.5).await;

    let json = app
        .send_json(
            "POST",
            "/payment-checkout-session",
            None,
            Some(json!({"parcelId": parcel.id, "cost": 0.01})),
            StatusCode::OK,
        )
        .await;
    assert!(json["url"]
        .as_str()
        .unwrap()
        .starts_with("https://checkout.stripe.test/"));

    let created = app.gateway.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount_cents, 4250);
    assert_eq!(created[0].currency, "usd");
    assert_eq!(created[0].customer_email, "sender@example.com");
    assert_eq!(created[0].metadata.parcel_id, parcel.id);
    assert_eq!(created[0].metadata.tracking_id, parcel.tracking_id);
    assert_eq!(
        created[0].cancel_url,
        "http://localhost:5173/dashboard/payment-cancelled"
    );
}

#[tokio::test]
async fn test_checkout_errors() {
    let app = create_test_app();

    app.send_json(
        "POST",
        "/payment-checkout-session",
        None,
        Some(json!({"parcelId": "missing"})),
        StatusCode::NOT_FOUND,
    )
    .await;

    let parcel = app.create_paid_parcel("sender@example.com").await;
    let json = app
        .send_json(
            "POST",
            "/payment-checkout-session",
            None,
            Some(json!({"parcelId": parcel.id})),
            StatusCode::CONFLICT,
        )
        .await;
    assert_eq!(json["error"], "conflict");
}

#[tokio::test]
async fn test_confirm_payment_is_idempotent() {
    let app = create_test_app();
    let parcel = app.create_parcel("sender@example.com", 30.0).await;
    app.gateway.add_session("cs_twice", &parcel, "paid");

    let first = app
        .send_json(
            "PATCH",
            "/payment-success?session_id=cs_twice",
            None,
            None,
            StatusCode::OK,
        )
        .await;
    let second = app
        .send_json(
            "PATCH",
            "/payment-success?session_id=cs_twice",
            None,
            None,
            StatusCode::OK,
        )
        .await;

    assert_eq!(first["success"], true);
    assert_eq!(second["success"], true);
    assert_eq!(second["alreadyRecorded"], true);
    assert_eq!(first["trackingId"], parcel.tracking_id.as_str());
    assert_eq!(first["trackingId"], second["trackingId"]);
    assert_eq!(first["transactionId"], "pi_cs_twice");

    let payments = app.store.list_payments("sender@example.com").await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].transaction_id, "pi_cs_twice");
    assert!((payments[0].amount - 30.0).abs() < 1e-9);

    let stored = app.store.get_parcel(&parcel.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.delivery_status, DeliveryStatus::PendingPickup);
    assert!(stored.paid_at.is_some());

    let paid_events = tracking_statuses(&app, &parcel.tracking_id)
        .await
        .into_iter()
        .filter(|s| s == "parcel_paid")
        .count();
    assert_eq!(paid_events, 1);
}

#[tokio::test]
async fn test_unpaid_session_changes_nothing() {
    let app = create_test_app();
    let parcel = app.create_parcel("sender@example.com", 30.0).await;
    app.gateway.add_session("cs_open", &parcel, "unpaid");

    let json = app
        .send_json(
            "PATCH",
            "/payment-success?session_id=cs_open",
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(json, json!({"success": false}));

    let stored = app.store.get_parcel(&parcel.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Unpaid);
    assert_eq!(stored.delivery_status, DeliveryStatus::ParcelCreated);
    assert!(app
        .store
        .list_payments("sender@example.com")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_confirm_payment_requires_session_and_surfaces_gateway_errors() {
    let app = create_test_app();

    app.send_json("PATCH", "/payment-success", None, None, StatusCode::BAD_REQUEST)
        .await;

    let json = app
        .send_json(
            "PATCH",
            "/payment-success?session_id=cs_unknown",
            None,
            None,
            StatusCode::BAD_GATEWAY,
        )
        .await;
    assert_eq!(json["error"], "payment_gateway_error");
}

#[tokio::test]
async fn test_assign_rider_updates_parcel_and_rider() {
    let app = create_test_app();
    let admin = app.admin_token().await;
    let parcel = app.create_paid_parcel("sender@example.com").await;
    let rider_id = app.approved_rider("rider@example.com", &admin).await;

    let json = app
        .send_json(
            "PATCH",
            &format!("/parcels/{}", parcel.id),
            None,
            Some(json!({
                "riderId": rider_id,
                "riderName": "Spoofed Name",
                "riderEmail": "spoofed@example.com",
            })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(json["deliveryStatus"], "driver_assigned");

    let stored = app.store.get_parcel(&parcel.id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::DriverAssigned);
    assert_eq!(stored.rider_id.as_deref(), Some(rider_id.as_str()));
    assert_eq!(stored.rider_email.as_deref(), Some("rider@example.com"));

    let rider = app.store.get_rider(&rider_id).await.unwrap().unwrap();
    assert_eq!(rider.work_status, WorkStatus::InDelivery);

    let assigned_events = tracking_statuses(&app, &parcel.tracking_id)
        .await
        .into_iter()
        .filter(|s| s == "driver_assigned")
        .count();
    assert_eq!(assigned_events, 1);
}

#[tokio::test]
async fn test_assignment_rejections() {
    let app = create_test_app();
    let admin = app.admin_token().await;
    let rider_id = app.approved_rider("rider@example.com", &admin).await;

    // Unpaid parcel
    let unpaid = app.create_parcel("sender@example.com", 10.0).await;
    app.send_json(
        "PATCH",
        &format!("/parcels/{}", unpaid.id),
        None,
        Some(json!({"riderId": rider_id})),
        StatusCode::CONFLICT,
    )
    .await;

    // Rider still pending review
    let pending = app
        .send_json(
            "POST",
            "/riders",
            None,
            Some(json!({"name": "New", "email": "new@example.com", "district": "Dhaka"})),
            StatusCode::OK,
        )
        .await;
    let paid = app.create_paid_parcel("sender@example.com").await;
    app.send_json(
        "PATCH",
        &format!("/parcels/{}", paid.id),
        None,
        Some(json!({"riderId": pending["inserted"]})),
        StatusCode::CONFLICT,
    )
    .await;

    // Unknown rider
    app.send_json(
        "PATCH",
        &format!("/parcels/{}", paid.id),
        None,
        Some(json!({"riderId": "no-such-rider"})),
        StatusCode::NOT_FOUND,
    )
    .await;

    let stored = app.store.get_parcel(&paid.id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::PendingPickup);
    assert!(stored.rider_id.is_none());
}

#[tokio::test]
async fn test_delivery_frees_rider() {
    let app = create_test_app();
    let admin = app.admin_token().await;
    let parcel = app.create_paid_parcel("sender@example.com").await;
    let rider_id = app.approved_rider("rider@example.com", &admin).await;

    app.send_json(
        "PATCH",
        &format!("/parcels/{}", parcel.id),
        None,
        Some(json!({"riderId": rider_id})),
        StatusCode::OK,
    )
    .await;
    app.send_json(
        "PATCH",
        &format!("/parcels/{}/status", parcel.id),
        None,
        Some(json!({"deliveryStatus": "parcel_delivered"})),
        StatusCode::OK,
    )
    .await;

    let riders = app
        .store
        .list_riders(&RiderQuery {
            work_status: Some(WorkStatus::Available),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(riders.len(), 1);
    assert_eq!(riders[0].id, rider_id);
}

#[tokio::test]
async fn test_status_reports_only_move_forward() {
    let app = create_test_app();
    let admin = app.admin_token().await;
    let parcel = app.create_paid_parcel("sender@example.com").await;
    let status_uri = format!("/parcels/{}/status", parcel.id);

    // No rider yet
    app.send_json(
        "PATCH",
        &status_uri,
        None,
        Some(json!({"deliveryStatus": "rider_arriving"})),
        StatusCode::CONFLICT,
    )
    .await;

    let rider_id = app.approved_rider("rider@example.com", &admin).await;
    app.send_json(
        "PATCH",
        &format!("/parcels/{}", parcel.id),
        None,
        Some(json!({"riderId": rider_id})),
        StatusCode::OK,
    )
    .await;

    // Assignment and payment states are not reportable
    for status in ["driver_assigned", "pending-pickup"] {
        app.send_json(
            "PATCH",
            &status_uri,
            None,
            Some(json!({"deliveryStatus": status})),
            StatusCode::CONFLICT,
        )
        .await;
    }

    app.send_json(
        "PATCH",
        &status_uri,
        None,
        Some(json!({"deliveryStatus": "parcel_picked_up"})),
        StatusCode::OK,
    )
    .await;
    app.send_json(
        "PATCH",
        &status_uri,
        None,
        Some(json!({"deliveryStatus": "rider_arriving"})),
        StatusCode::CONFLICT,
    )
    .await;
}

#[tokio::test]
async fn test_parcel_listings() {
    let app = create_test_app();
    let admin = app.admin_token().await;

    let first = app.create_parcel("alice@example.com", 10.0).await;
    let second = app.create_paid_parcel("alice@example.com").await;
    app.create_parcel("bob@example.com", 10.0).await;

    let alice = app
        .send_json(
            "GET",
            "/parcels?email=alice@example.com",
            None,
            None,
            StatusCode::OK,
        )
        .await;
    let ids: Vec<&str> = alice
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [second.id.as_str(), first.id.as_str()]);

    let pending = app
        .send_json(
            "GET",
            "/parcels?email=&deliveryStatus=pending-pickup",
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    app.send_json(
        "GET",
        "/parcels?deliveryStatus=lost",
        None,
        None,
        StatusCode::BAD_REQUEST,
    )
    .await;

    // Rider views: active vs delivered
    let rider_id = app.approved_rider("rider@example.com", &admin).await;
    app.send_json(
        "PATCH",
        &format!("/parcels/{}", second.id),
        None,
        Some(json!({"riderId": rider_id})),
        StatusCode::OK,
    )
    .await;

    let active_uri = "/parcels/rider?riderEmail=rider@example.com";
    let delivered_uri =
        "/parcels/rider?riderEmail=rider@example.com&deliveryStatus=parcel_delivered";

    let active = app.send_json("GET", active_uri, None, None, StatusCode::OK).await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    let delivered = app
        .send_json("GET", delivered_uri, None, None, StatusCode::OK)
        .await;
    assert!(delivered.as_array().unwrap().is_empty());

    app.send_json(
        "PATCH",
        &format!("/parcels/{}/status", second.id),
        None,
        Some(json!({"deliveryStatus": "parcel_delivered"})),
        StatusCode::OK,
    )
    .await;

    let active = app.send_json("GET", active_uri, None, None, StatusCode::OK).await;
    assert!(active.as_array().unwrap().is_empty());
    let delivered = app
        .send_json("GET", delivered_uri, None, None, StatusCode::OK)
        .await;
    assert_eq!(delivered[0]["id"], second.id.as_str());
}

#[tokio::test]
async fn test_get_and_delete_parcel() {
    let app = create_test_app();
    let parcel = app.create_parcel("sender@example.com", 10.0).await;

    app.send_json("GET", "/parcels/missing", None, None, StatusCode::NOT_FOUND)
        .await;

    let json = app
        .send_json(
            "DELETE",
            &format!("/parcels/{}", parcel.id),
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(json, json!({"deletedCount": 1}));

    let json = app
        .send_json(
            "DELETE",
            &format!("/parcels/{}", parcel.id),
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(json, json!({"deletedCount": 0}));

    // History outlives the parcel
    assert_eq!(
        tracking_statuses(&app, &parcel.tracking_id).await,
        ["parcel_created"]
    );
}

#[tokio::test]
async fn test_invalid_parcel_body_is_rejected() {
    let app = create_test_app();

    let json = app
        .send_json(
            "POST",
            "/parcels",
            None,
            Some(json!({"senderEmail": "not-an-email", "parcelName": "X", "cost": 5})),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(json["error"], "bad_request");

    app.send_json(
        "POST",
        "/parcels",
        None,
        Some(json!({"senderEmail": "a@example.com", "parcelName": "X", "cost": -1})),
        StatusCode::BAD_REQUEST,
    )
    .await;
}
