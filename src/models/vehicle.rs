//! Modelo de Vehicle
//! 
//! Este módulo contiene el struct Vehicle, su tipo y su estado operativo.
//! Mapea exactamente a la tabla `vehicles` del schema PostgreSQL.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use rust_decimal::Decimal;

/// Tipo de vehículo - mapea al ENUM vehicle_type.
/// También es la categoría de licencia que un conductor necesita para llevarlo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Truck,
    Van,
    Bike,
}

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    OnTrip,
    InShop,
    Retired,
    Suspended,
}

impl VehicleStatus {
    /// Estados fijados por un administrador, no derivados de viajes ni órdenes
    pub fn is_administrative(self) -> bool {
        matches!(self, VehicleStatus::Retired | VehicleStatus::Suspended)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::OnTrip => "on_trip",
            VehicleStatus::InShop => "in_shop",
            VehicleStatus::Retired => "retired",
            VehicleStatus::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VehicleType::Truck => "truck",
            VehicleType::Van => "van",
            VehicleType::Bike => "bike",
        };
        f.write_str(name)
    }
}

/// Vehicle principal - mapea exactamente a la tabla vehicles.
///
/// `status` es un campo derivado: solo el ledger de disponibilidad lo escribe.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    pub max_capacity: Decimal,
    pub odometer: Decimal,
    pub status: VehicleStatus,
    pub region: Option<String>,
    pub acquisition_cost: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos de registro de un vehículo nuevo
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub name: String,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    pub max_capacity: Decimal,
    pub odometer: Decimal,
    pub region: Option<String>,
    pub acquisition_cost: Decimal,
}

impl Vehicle {
    pub fn register(new: NewVehicle, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            license_plate: new.license_plate,
            vehicle_type: new.vehicle_type,
            max_capacity: new.max_capacity,
            odometer: new.odometer,
            status: VehicleStatus::Available,
            region: new.region,
            acquisition_cost: new.acquisition_cost,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Cambios de perfil de un vehículo. Nunca incluye `status`.
#[derive(Debug, Clone, Default)]
pub struct VehiclePatch {
    pub name: Option<String>,
    pub region: Option<String>,
    pub max_capacity: Option<Decimal>,
    pub acquisition_cost: Option<Decimal>,
}

impl VehiclePatch {
    pub fn apply(&self, vehicle: &mut Vehicle) {
        if let Some(name) = &self.name {
            vehicle.name = name.clone();
        }
        if let Some(region) = &self.region {
            vehicle.region = Some(region.clone());
        }
        if let Some(capacity) = self.max_capacity {
            vehicle.max_capacity = capacity;
        }
        if let Some(cost) = self.acquisition_cost {
            vehicle.acquisition_cost = cost;
        }
    }
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub vehicle_type: Option<VehicleType>,
    pub region: Option<String>,
}

impl VehicleFilters {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        self.status.map_or(true, |s| vehicle.status == s)
            && self.vehicle_type.map_or(true, |t| vehicle.vehicle_type == t)
            && self
                .region
                .as_deref()
                .map_or(true, |r| vehicle.region.as_deref() == Some(r))
    }
}
