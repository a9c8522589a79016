//! Fixtures compartidos por los tests unitarios

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Driver, MaintenanceOrder, NewDriver, NewMaintenanceOrder, NewTrip, NewVehicle, Trip, Vehicle,
    VehicleType,
};
use crate::repositories::{EntityStore, MemoryStore};
use super::CoreContext;

pub fn vehicle(capacity: i64) -> Vehicle {
    Vehicle::register(
        NewVehicle {
            name: "Volvo FH".to_string(),
            license_plate: format!("TRK-{}", &Uuid::new_v4().simple().to_string()[..8]),
            vehicle_type: VehicleType::Truck,
            max_capacity: Decimal::from(capacity),
            odometer: Decimal::ZERO,
            region: Some("north".to_string()),
            acquisition_cost: Decimal::from(85000),
        },
        Utc::now(),
    )
}

pub fn driver() -> Driver {
    Driver::register(
        NewDriver {
            full_name: "Alex Moreau".to_string(),
            license_number: format!("LIC-{}", Uuid::new_v4().simple()),
            license_category: VehicleType::Truck,
            license_expiry: Utc::now().date_naive() + Duration::days(365),
            safety_score: 92,
        },
        Utc::now(),
    )
}

pub fn trip_for(vehicle: &Vehicle, driver: &Driver, cargo: i64) -> Trip {
    Trip::draft(
        NewTrip {
            vehicle_id: vehicle.id,
            driver_id: driver.id,
            origin: "Depot A".to_string(),
            destination: "Warehouse B".to_string(),
            cargo_weight: Decimal::from(cargo),
            date_start: None,
            odometer_start: None,
        },
        Utc::now(),
    )
}

pub fn order_for(vehicle: &Vehicle) -> MaintenanceOrder {
    MaintenanceOrder::schedule(
        NewMaintenanceOrder {
            vehicle_id: vehicle.id,
            description: "Brake pads".to_string(),
            service_date: None,
            cost: Some(Decimal::from(320)),
            mechanic: Some("Garage Nord".to_string()),
        },
        Utc::now(),
    )
}

/// Contexto sobre un `MemoryStore` con un vehículo y un conductor compatibles
pub async fn seeded_context(capacity: i64) -> (CoreContext, Vehicle, Driver) {
    let store = Arc::new(MemoryStore::new());
    let v = vehicle(capacity);
    let d = driver();
    store.insert_vehicle(&v).await.unwrap();
    store.insert_driver(&d).await.unwrap();
    (CoreContext::new(store), v, d)
}
