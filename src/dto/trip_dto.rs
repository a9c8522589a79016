use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::NewTrip;
use crate::utils::validation::{validate_non_negative, validate_not_blank};

// Request para crear un viaje
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTripRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,

    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub origin: String,

    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub destination: String,

    #[validate(custom = "validate_non_negative")]
    pub cargo_weight: Decimal,

    pub date_start: Option<DateTime<Utc>>,

    #[validate(custom = "validate_non_negative")]
    pub odometer_start: Option<Decimal>,
}

impl From<CreateTripRequest> for NewTrip {
    fn from(request: CreateTripRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            origin: request.origin.trim().to_string(),
            destination: request.destination.trim().to_string(),
            cargo_weight: request.cargo_weight,
            date_start: request.date_start,
            odometer_start: request.odometer_start,
        }
    }
}

// Request para cerrar un viaje
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CompleteTripRequest {
    #[validate(custom = "validate_non_negative")]
    pub odometer_end: Option<Decimal>,
}
