use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{MaintenancePatch, NewMaintenanceOrder};
use crate::utils::validation::{validate_non_negative, validate_not_blank};

// Request para abrir una orden de mantenimiento
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMaintenanceRequest {
    pub vehicle_id: Uuid,

    #[validate(length(max = 1000), custom = "validate_not_blank")]
    pub description: String,

    pub service_date: Option<NaiveDate>,

    #[validate(custom = "validate_non_negative")]
    pub cost: Option<Decimal>,

    #[validate(length(min = 1, max = 255))]
    pub mechanic: Option<String>,
}

impl From<CreateMaintenanceRequest> for NewMaintenanceOrder {
    fn from(request: CreateMaintenanceRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            description: request.description.trim().to_string(),
            service_date: request.service_date,
            cost: request.cost,
            mechanic: request.mechanic,
        }
    }
}

// Request para editar una orden abierta
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMaintenanceRequest {
    #[validate(length(max = 1000), custom = "validate_not_blank")]
    pub description: Option<String>,

    #[validate(custom = "validate_non_negative")]
    pub cost: Option<Decimal>,

    #[validate(length(min = 1, max = 255))]
    pub mechanic: Option<String>,

    pub service_date: Option<NaiveDate>,
}

impl From<UpdateMaintenanceRequest> for MaintenancePatch {
    fn from(request: UpdateMaintenanceRequest) -> Self {
        Self {
            description: request.description.map(|d| d.trim().to_string()),
            cost: request.cost,
            mechanic: request.mechanic,
            service_date: request.service_date,
        }
    }
}
