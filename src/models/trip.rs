//! Modelo de Trip
//! 
//! Un viaje asigna un vehículo y un conductor entre dos ubicaciones.
//! Su ciclo de vida es `draft → dispatched → {completed | cancelled}`.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;
use rust_decimal::Decimal;

/// Estado del viaje - mapea al ENUM trip_state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripState {
    Draft,
    Dispatched,
    Completed,
    Cancelled,
}

impl TripState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TripState::Completed | TripState::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripState::Draft => "draft",
            TripState::Dispatched => "dispatched",
            TripState::Completed => "completed",
            TripState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TripState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip principal - mapea a la tabla trips
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub reference: String,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub cargo_weight: Decimal,
    pub state: TripState,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub odometer_start: Option<Decimal>,
    pub odometer_end: Option<Decimal>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos de un viaje nuevo, ya validados
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub cargo_weight: Decimal,
    pub date_start: Option<DateTime<Utc>>,
    pub odometer_start: Option<Decimal>,
}

impl Trip {
    pub fn draft(new: NewTrip, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference: generate_reference(now),
            vehicle_id: new.vehicle_id,
            driver_id: new.driver_id,
            origin: new.origin,
            destination: new.destination,
            cargo_weight: new.cargo_weight,
            state: TripState::Draft,
            date_start: new.date_start,
            date_end: None,
            odometer_start: new.odometer_start,
            odometer_end: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Código de referencia legible, p.ej. `TRP-20250114-K3F9QZ`
pub fn generate_reference(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("TRP-{}-{}", now.format("%Y%m%d"), suffix)
}

/// Filtros para búsqueda de viajes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripFilters {
    pub state: Option<TripState>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

impl TripFilters {
    pub fn matches(&self, trip: &Trip) -> bool {
        self.state.map_or(true, |s| trip.state == s)
            && self.vehicle_id.map_or(true, |v| trip.vehicle_id == v)
            && self.driver_id.map_or(true, |d| trip.driver_id == d)
    }
}
