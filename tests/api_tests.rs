use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use fleet_dispatch::build_router;
use fleet_dispatch::config::environment::EnvironmentConfig;
use fleet_dispatch::repositories::MemoryStore;
use fleet_dispatch::state::AppState;

struct TestResponse {
    status: StatusCode,
    body: Value,
}

fn create_test_app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), EnvironmentConfig::default());
    build_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse { status, body }
}

async fn post(app: &Router, uri: &str, body: Value) -> TestResponse {
    send(app, Method::POST, uri, Some(body)).await
}

async fn post_empty(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::POST, uri, None).await
}

async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None).await
}

async fn register_vehicle(app: &Router, plate: &str, capacity: u32, odometer: u32) -> String {
    let response = post(
        app,
        "/api/vehicles",
        json!({
            "name": "Volvo FH",
            "license_plate": plate,
            "vehicle_type": "truck",
            "max_capacity": capacity,
            "odometer": odometer
        }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.body["data"]["id"].as_str().unwrap().to_string()
}

async fn register_driver(app: &Router, license: &str) -> String {
    let expiry = Utc::now().date_naive() + Duration::days(365);
    let response = post(
        app,
        "/api/drivers",
        json!({
            "full_name": "Ana Ruiz",
            "license_number": license,
            "license_category": "truck",
            "license_expiry": expiry
        }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_trip(app: &Router, vehicle_id: &str, driver_id: &str, cargo: u32) -> TestResponse {
    post(
        app,
        "/api/trips",
        json!({
            "vehicle_id": vehicle_id,
            "driver_id": driver_id,
            "origin": "Depot",
            "destination": "Port",
            "cargo_weight": cargo
        }),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = get(&app, "/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_trip_lifecycle() {
    let app = create_test_app();
    let vehicle_id = register_vehicle(&app, "AB-123-CD", 1000, 40000).await;
    let driver_id = register_driver(&app, "LIC-0001").await;

    let created = create_trip(&app, &vehicle_id, &driver_id, 800).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["success"], true);
    assert_eq!(created.body["data"]["trip"]["state"], "draft");
    assert_eq!(created.body["data"]["vehicle"]["status"], "available");
    let trip_id = created.body["data"]["trip"]["id"].as_str().unwrap().to_string();
    assert!(created.body["data"]["trip"]["reference"]
        .as_str()
        .unwrap()
        .starts_with("TRP-"));

    let dispatched = post_empty(&app, &format!("/api/trips/{}/dispatch", trip_id)).await;
    assert_eq!(dispatched.status, StatusCode::OK);
    assert_eq!(dispatched.body["data"]["trip"]["state"], "dispatched");
    assert_eq!(dispatched.body["data"]["vehicle"]["status"], "on_trip");
    assert_eq!(dispatched.body["data"]["driver"]["status"], "on_duty");

    let completed = post(
        &app,
        &format!("/api/trips/{}/complete", trip_id),
        json!({ "odometer_end": 45000 }),
    )
    .await;
    assert_eq!(completed.status, StatusCode::OK);
    assert_eq!(completed.body["data"]["trip"]["state"], "completed");
    assert_eq!(completed.body["data"]["vehicle"]["status"], "available");
    assert_eq!(completed.body["data"]["vehicle"]["odometer"], "45000");
    assert_eq!(completed.body["data"]["driver"]["status"], "off_duty");
    assert_eq!(completed.body["data"]["driver"]["trips_completed"], 1);

    let again = post_empty(&app, &format!("/api/trips/{}/cancel", trip_id)).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["code"], "TRIP_NOT_ACTIVE");
}

#[tokio::test]
async fn test_capacity_violation_is_unprocessable() {
    let app = create_test_app();
    let vehicle_id = register_vehicle(&app, "CAP-001", 500, 0).await;
    let driver_id = register_driver(&app, "LIC-0002").await;

    let response = create_trip(&app, &vehicle_id, &driver_id, 800).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["code"], "CAPACITY_EXCEEDED");

    let trips = get(&app, "/api/trips").await;
    assert_eq!(trips.body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_odometer_cannot_go_backwards() {
    let app = create_test_app();
    let vehicle_id = register_vehicle(&app, "ODO-001", 1000, 40000).await;
    let driver_id = register_driver(&app, "LIC-0003").await;
    let trip_id = create_trip(&app, &vehicle_id, &driver_id, 100).await.body["data"]["trip"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    post_empty(&app, &format!("/api/trips/{}/dispatch", trip_id)).await;

    let response = post(
        &app,
        &format!("/api/trips/{}/complete", trip_id),
        json!({ "odometer_end": 39000 }),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["code"], "INVALID_ODOMETER");

    let trip = get(&app, &format!("/api/trips/{}", trip_id)).await;
    assert_eq!(trip.body["data"]["trip"]["state"], "dispatched");
}

#[tokio::test]
async fn test_not_found_and_validation_errors() {
    let app = create_test_app();

    let missing = get(&app, &format!("/api/trips/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["code"], "TRIP_NOT_FOUND");

    let vehicle_id = register_vehicle(&app, "VAL-001", 1000, 0).await;
    let driver_id = register_driver(&app, "LIC-0004").await;
    let invalid = post(
        &app,
        "/api/trips",
        json!({
            "vehicle_id": vehicle_id,
            "driver_id": driver_id,
            "origin": "  ",
            "destination": "Port",
            "cargo_weight": -5
        }),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_maintenance_smart_revert() {
    let app = create_test_app();
    let vehicle_id = register_vehicle(&app, "SHOP-001", 1000, 0).await;

    let mut order_ids = Vec::new();
    for description in ["Tyres", "Brakes"] {
        let response = post(
            &app,
            "/api/maintenance",
            json!({ "vehicle_id": vehicle_id, "description": description, "cost": 120 }),
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["vehicle"]["status"], "in_shop");
        order_ids.push(response.body["data"]["order"]["id"].as_str().unwrap().to_string());
    }

    let first = post_empty(&app, &format!("/api/maintenance/{}/complete", order_ids[0])).await;
    assert_eq!(first.body["data"]["order"]["state"], "done");
    assert_eq!(first.body["data"]["vehicle"]["status"], "in_shop");

    let second = post_empty(&app, &format!("/api/maintenance/{}/complete", order_ids[1])).await;
    assert_eq!(second.body["data"]["vehicle"]["status"], "available");

    let repeated = post_empty(&app, &format!("/api/maintenance/{}/complete", order_ids[1])).await;
    assert_eq!(repeated.status, StatusCode::CONFLICT);
    assert_eq!(repeated.body["code"], "MAINTENANCE_ORDER_ALREADY_DONE");
}

#[tokio::test]
async fn test_vehicle_in_shop_cannot_take_trips() {
    let app = create_test_app();
    let vehicle_id = register_vehicle(&app, "SHOP-002", 1000, 0).await;
    let driver_id = register_driver(&app, "LIC-0005").await;
    post(
        &app,
        "/api/maintenance",
        json!({ "vehicle_id": vehicle_id, "description": "Engine" }),
    )
    .await;

    let response = create_trip(&app, &vehicle_id, &driver_id, 10).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["code"], "VEHICLE_UNAVAILABLE");
}

#[tokio::test]
async fn test_concurrent_dispatch_has_single_winner() {
    let app = create_test_app();
    let vehicle_id = register_vehicle(&app, "RACE-001", 1000, 0).await;
    let first_driver = register_driver(&app, "LIC-0006").await;
    let second_driver = register_driver(&app, "LIC-0007").await;

    let mut trip_ids = Vec::new();
    for driver_id in [&first_driver, &second_driver] {
        let created = create_trip(&app, &vehicle_id, driver_id, 10).await;
        assert_eq!(created.status, StatusCode::OK);
        trip_ids.push(created.body["data"]["trip"]["id"].as_str().unwrap().to_string());
    }

    let uris: Vec<String> = trip_ids
        .iter()
        .map(|id| format!("/api/trips/{}/dispatch", id))
        .collect();
    let responses = futures::future::join_all(uris.iter().map(|uri| post_empty(&app, uri))).await;

    let winners = responses.iter().filter(|r| r.status == StatusCode::OK).count();
    assert_eq!(winners, 1);
    let loser = responses
        .iter()
        .find(|r| r.status != StatusCode::OK)
        .unwrap();
    assert_eq!(loser.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(loser.body["code"], "VEHICLE_UNAVAILABLE");

    let vehicle = get(&app, &format!("/api/vehicles/{}", vehicle_id)).await;
    assert_eq!(vehicle.body["data"]["status"], "on_trip");
}

#[tokio::test]
async fn test_command_endpoint_and_reconcile() {
    let app = create_test_app();
    let vehicle_id = register_vehicle(&app, "CMD-001", 1000, 0).await;
    let driver_id = register_driver(&app, "LIC-0008").await;

    let created = post(
        &app,
        "/api/commands",
        json!({
            "type": "create_trip",
            "vehicle_id": vehicle_id,
            "driver_id": driver_id,
            "origin": "Depot",
            "destination": "Port",
            "cargo_weight": 50
        }),
    )
    .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["data"]["kind"], "trip");
    let trip_id = created.body["data"]["entity"]["trip"]["id"].as_str().unwrap().to_string();

    let dispatched = post(
        &app,
        "/api/commands",
        json!({ "type": "dispatch_trip", "trip_id": trip_id }),
    )
    .await;
    assert_eq!(dispatched.status, StatusCode::OK);
    assert_eq!(dispatched.body["data"]["entity"]["vehicle"]["status"], "on_trip");

    let report = post_empty(&app, "/api/admin/reconcile").await;
    assert_eq!(report.status, StatusCode::OK);
    assert_eq!(report.body["data"]["vehicles_checked"], 1);
    assert_eq!(report.body["data"]["corrections"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_retire_vehicle_removes_it_from_dispatch() {
    let app = create_test_app();
    let vehicle_id = register_vehicle(&app, "OLD-001", 1000, 0).await;
    let driver_id = register_driver(&app, "LIC-0009").await;

    let retired = send(&app, Method::DELETE, &format!("/api/vehicles/{}", vehicle_id), None).await;
    assert_eq!(retired.status, StatusCode::OK);
    assert_eq!(retired.body["data"]["status"], "retired");

    let response = create_trip(&app, &vehicle_id, &driver_id, 10).await;
    assert_eq!(response.body["code"], "VEHICLE_UNAVAILABLE");

    let available = get(&app, "/api/vehicles?status=available").await;
    assert_eq!(available.body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_amounts_beyond_column_range_are_rejected() {
    let app = create_test_app();

    let vehicle = post(
        &app,
        "/api/vehicles",
        json!({
            "name": "Volvo FH",
            "license_plate": "BIG-001",
            "vehicle_type": "truck",
            "max_capacity": 10_000_000_000u64
        }),
    )
    .await;
    assert_eq!(vehicle.status, StatusCode::BAD_REQUEST);
    assert_eq!(vehicle.body["code"], "VALIDATION_ERROR");

    let vehicle_id = register_vehicle(&app, "BIG-002", 1000, 0).await;
    let driver_id = register_driver(&app, "LIC-0010").await;
    let trip_id = create_trip(&app, &vehicle_id, &driver_id, 10).await.body["data"]["trip"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    post_empty(&app, &format!("/api/trips/{}/dispatch", trip_id)).await;

    let response = post(
        &app,
        &format!("/api/trips/{}/complete", trip_id),
        json!({ "odometer_end": 10_000_000_000u64 }),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");

    let trip = get(&app, &format!("/api/trips/{}", trip_id)).await;
    assert_eq!(trip.body["data"]["trip"]["state"], "dispatched");
}
