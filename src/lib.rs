//! Núcleo de despacho de flota
//! 
//! Máquina de estados de viajes, ledger de disponibilidad de vehículos y
//! conductores y órdenes de mantenimiento, expuestos como API HTTP con Axum.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use middleware::cors::cors_middleware;
use state::AppState;

const MAX_IN_FLIGHT_REQUESTS: usize = 512;

/// Construir el router completo de la API
pub fn build_router(state: AppState) -> Router {
    let cors = cors_middleware(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/commands", routes::command_routes::create_command_router())
        .nest("/api/admin", routes::command_routes::create_admin_router())
        .nest("/api/trips", routes::trip_routes::create_trip_router())
        .nest("/api/maintenance", routes::maintenance_routes::create_maintenance_router())
        .nest("/api/vehicles", routes::vehicle_routes::create_vehicle_router())
        .nest("/api/drivers", routes::driver_routes::create_driver_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT_REQUESTS))
                .layer(cors),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
