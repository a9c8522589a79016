//! Modelo de Driver
//! 
//! Conductores de la flota con su licencia y estado de servicio.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::vehicle::VehicleType;

/// Estado del conductor - mapea al ENUM driver_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "driver_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    OffDuty,
    OnDuty,
    Suspended,
}

impl DriverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::OffDuty => "off_duty",
            DriverStatus::OnDuty => "on_duty",
            DriverStatus::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver principal - mapea a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Driver {
    pub id: Uuid,
    pub full_name: String,
    pub license_number: String,
    pub license_category: VehicleType,
    pub license_expiry: NaiveDate,
    pub safety_score: i16,
    pub status: DriverStatus,
    pub trips_completed: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDriver {
    pub full_name: String,
    pub license_number: String,
    pub license_category: VehicleType,
    pub license_expiry: NaiveDate,
    pub safety_score: i16,
}

impl Driver {
    pub fn register(new: NewDriver, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: new.full_name,
            license_number: new.license_number,
            license_category: new.license_category,
            license_expiry: new.license_expiry,
            safety_score: new.safety_score,
            status: DriverStatus::OffDuty,
            trips_completed: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// La licencia vale hasta el final del día de vencimiento
    pub fn license_valid_on(&self, day: NaiveDate) -> bool {
        self.license_expiry >= day
    }
}

/// Cambios de perfil de un conductor (sin estado ni contador de viajes)
#[derive(Debug, Clone, Default)]
pub struct DriverPatch {
    pub full_name: Option<String>,
    pub license_category: Option<VehicleType>,
    pub license_expiry: Option<NaiveDate>,
    pub safety_score: Option<i16>,
}

impl DriverPatch {
    pub fn apply(&self, driver: &mut Driver) {
        if let Some(name) = &self.full_name {
            driver.full_name = name.clone();
        }
        if let Some(category) = self.license_category {
            driver.license_category = category;
        }
        if let Some(expiry) = self.license_expiry {
            driver.license_expiry = expiry;
        }
        if let Some(score) = self.safety_score {
            driver.safety_score = score;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriverFilters {
    pub status: Option<DriverStatus>,
    pub license_category: Option<VehicleType>,
}

impl DriverFilters {
    pub fn matches(&self, driver: &Driver) -> bool {
        self.status.map_or(true, |s| driver.status == s)
            && self.license_category.map_or(true, |c| driver.license_category == c)
    }
}
