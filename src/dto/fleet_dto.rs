use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::{DriverPatch, NewDriver, NewVehicle, VehiclePatch, VehicleType};
use crate::utils::validation::{validate_non_negative, validate_not_blank, validate_positive};

// Request para registrar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterVehicleRequest {
    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub name: String,

    #[validate(length(min = 2, max = 20))]
    pub license_plate: String,

    pub vehicle_type: VehicleType,

    #[validate(custom = "validate_positive")]
    pub max_capacity: Decimal,

    #[validate(custom = "validate_non_negative")]
    pub odometer: Option<Decimal>,

    #[validate(length(min = 1, max = 100))]
    pub region: Option<String>,

    #[validate(custom = "validate_non_negative")]
    pub acquisition_cost: Option<Decimal>,
}

impl From<RegisterVehicleRequest> for NewVehicle {
    fn from(request: RegisterVehicleRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            license_plate: request.license_plate.trim().to_uppercase(),
            vehicle_type: request.vehicle_type,
            max_capacity: request.max_capacity,
            odometer: request.odometer.unwrap_or(Decimal::ZERO),
            region: request.region,
            acquisition_cost: request.acquisition_cost.unwrap_or(Decimal::ZERO),
        }
    }
}

// Request para actualizar un vehículo (el estado no se edita por aquí)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub region: Option<String>,

    #[validate(custom = "validate_positive")]
    pub max_capacity: Option<Decimal>,

    #[validate(custom = "validate_non_negative")]
    pub acquisition_cost: Option<Decimal>,
}

impl From<UpdateVehicleRequest> for VehiclePatch {
    fn from(request: UpdateVehicleRequest) -> Self {
        Self {
            name: request.name,
            region: request.region,
            max_capacity: request.max_capacity,
            acquisition_cost: request.acquisition_cost,
        }
    }
}

// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterDriverRequest {
    #[validate(length(max = 150), custom = "validate_not_blank")]
    pub full_name: String,

    #[validate(length(min = 3, max = 50))]
    pub license_number: String,

    pub license_category: VehicleType,

    pub license_expiry: NaiveDate,

    #[validate(range(min = 0, max = 100))]
    pub safety_score: Option<i16>,
}

impl From<RegisterDriverRequest> for NewDriver {
    fn from(request: RegisterDriverRequest) -> Self {
        Self {
            full_name: request.full_name.trim().to_string(),
            license_number: request.license_number.trim().to_string(),
            license_category: request.license_category,
            license_expiry: request.license_expiry,
            safety_score: request.safety_score.unwrap_or(100),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDriverRequest {
    #[validate(length(max = 150), custom = "validate_not_blank")]
    pub full_name: Option<String>,

    pub license_category: Option<VehicleType>,

    pub license_expiry: Option<NaiveDate>,

    #[validate(range(min = 0, max = 100))]
    pub safety_score: Option<i16>,
}

impl From<UpdateDriverRequest> for DriverPatch {
    fn from(request: UpdateDriverRequest) -> Self {
        Self {
            full_name: request.full_name,
            license_category: request.license_category,
            license_expiry: request.license_expiry,
            safety_score: request.safety_score,
        }
    }
}
