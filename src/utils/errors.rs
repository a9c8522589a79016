//! Sistema de manejo de errores
//! 
//! Este módulo define los errores del store, los errores de política del núcleo
//! de despacho y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{DriverStatus, TripState, VehicleStatus, VehicleType};

/// Entidades persistidas por el store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Vehicle,
    Driver,
    Trip,
    MaintenanceOrder,
}

impl Entity {
    fn code_prefix(self) -> &'static str {
        match self {
            Entity::Vehicle => "VEHICLE",
            Entity::Driver => "DRIVER",
            Entity::Trip => "TRIP",
            Entity::MaintenanceOrder => "MAINTENANCE_ORDER",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Vehicle => "Vehicle",
            Entity::Driver => "Driver",
            Entity::Trip => "Trip",
            Entity::MaintenanceOrder => "Maintenance order",
        };
        f.write_str(name)
    }
}

/// Errores del Entity Store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} was modified concurrently")]
    VersionConflict { entity: Entity, id: Uuid },

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: Uuid },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: &'static str, value: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Regla de negocio concreta que rechazó una transición
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    VehicleUnavailable { status: VehicleStatus },
    CapacityExceeded { cargo_weight: Decimal, max_capacity: Decimal },
    DriverSuspended,
    DriverOnDuty,
    LicenseExpired { expiry: NaiveDate },
    LicenseCategoryMismatch { license: VehicleType, vehicle: VehicleType },
    InvalidOdometer { reading: Decimal, minimum: Decimal },
    VehicleOnTrip,
    DriverStatusLocked { status: DriverStatus },
    InvalidField { field: &'static str, message: String },
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Violation::VehicleUnavailable { .. } => "VEHICLE_UNAVAILABLE",
            Violation::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Violation::DriverSuspended => "DRIVER_SUSPENDED",
            Violation::DriverOnDuty => "DRIVER_ON_DUTY",
            Violation::LicenseExpired { .. } => "LICENSE_EXPIRED",
            Violation::LicenseCategoryMismatch { .. } => "LICENSE_CATEGORY_MISMATCH",
            Violation::InvalidOdometer { .. } => "INVALID_ODOMETER",
            Violation::VehicleOnTrip => "VEHICLE_ON_TRIP",
            Violation::DriverStatusLocked { .. } => "DRIVER_STATUS_LOCKED",
            Violation::InvalidField { .. } => "INVALID_FIELD",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::VehicleUnavailable { status } => {
                write!(f, "vehicle is not available (status: {})", status)
            }
            Violation::CapacityExceeded { cargo_weight, max_capacity } => write!(
                f,
                "capacity exceeded: cargo weight {} exceeds vehicle maximum {}",
                cargo_weight, max_capacity
            ),
            Violation::DriverSuspended => f.write_str("driver is suspended"),
            Violation::DriverOnDuty => f.write_str("driver is already on duty"),
            Violation::LicenseExpired { expiry } => {
                write!(f, "driver license expired on {}", expiry)
            }
            Violation::LicenseCategoryMismatch { license, vehicle } => write!(
                f,
                "driver license category '{}' does not match vehicle type '{}'",
                license, vehicle
            ),
            Violation::InvalidOdometer { reading, minimum } => write!(
                f,
                "odometer reading {} is below the last known reading {}",
                reading, minimum
            ),
            Violation::VehicleOnTrip => f.write_str("vehicle is currently on a trip"),
            Violation::DriverStatusLocked { status } => {
                write!(f, "driver status '{}' cannot be changed administratively", status)
            }
            Violation::InvalidField { field, message } => write!(f, "{}: {}", field, message),
        }
    }
}

/// Clase de estado estilo HTTP que el transporte traduce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    NotFound,
    Conflict,
    Unprocessable,
    Unavailable,
}

impl StatusClass {
    pub fn http_status(self) -> StatusCode {
        match self {
            StatusClass::NotFound => StatusCode::NOT_FOUND,
            StatusClass::Conflict => StatusCode::CONFLICT,
            StatusClass::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            StatusClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Errores de las transiciones del núcleo. Todos quedan acotados al comando
/// que los produjo; el núcleo nunca reintenta.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: Entity, id: Uuid },

    #[error("Cannot {action} trip in state '{state}'")]
    PreconditionFailed { action: &'static str, state: TripState },

    #[error("Policy violation: {0}")]
    PolicyViolation(Violation),

    #[error("{entity} '{id}' was modified by a concurrent command")]
    Conflict { entity: Entity, id: Uuid },

    #[error("{entity} '{id}' is already {state}")]
    AlreadyTerminal { entity: Entity, id: Uuid, state: &'static str },

    #[error("Cannot {action} maintenance order in state '{state}'")]
    OrderPreconditionFailed { action: &'static str, state: &'static str },

    #[error("Storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl PolicyError {
    /// Código legible por máquina de la comprobación que falló
    pub fn code(&self) -> String {
        match self {
            PolicyError::NotFound { entity, .. } => format!("{}_NOT_FOUND", entity.code_prefix()),
            PolicyError::PreconditionFailed { action, .. } => {
                format!("TRIP_NOT_{}", required_state(action).to_ascii_uppercase())
            }
            PolicyError::PolicyViolation(v) => v.code().to_string(),
            PolicyError::Conflict { .. } => "CONCURRENT_MODIFICATION".to_string(),
            PolicyError::AlreadyTerminal { entity, .. } => {
                format!("{}_ALREADY_DONE", entity.code_prefix())
            }
            PolicyError::OrderPreconditionFailed { .. } => "MAINTENANCE_ORDER_NOT_SCHEDULED".to_string(),
            PolicyError::Storage(_) => "STORAGE_UNAVAILABLE".to_string(),
        }
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            PolicyError::NotFound { .. } => StatusClass::NotFound,
            PolicyError::PreconditionFailed { .. }
            | PolicyError::Conflict { .. }
            | PolicyError::AlreadyTerminal { .. }
            | PolicyError::OrderPreconditionFailed { .. } => StatusClass::Conflict,
            PolicyError::PolicyViolation(_) => StatusClass::Unprocessable,
            PolicyError::Storage(_) => StatusClass::Unavailable,
        }
    }

    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        PolicyError::NotFound { entity, id }
    }
}

fn required_state(action: &str) -> &'static str {
    match action {
        "dispatch" => "draft",
        "complete" => "dispatched",
        _ => "active",
    }
}

impl From<Violation> for PolicyError {
    fn from(violation: Violation) -> Self {
        PolicyError::PolicyViolation(violation)
    }
}

impl From<StoreError> for PolicyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { entity, id } => PolicyError::Conflict { entity, id },
            StoreError::NotFound { entity, id } => PolicyError::NotFound { entity, id },
            StoreError::Duplicate { field, value } => {
                PolicyError::PolicyViolation(Violation::InvalidField {
                    field,
                    message: format!("'{}' already exists", value),
                })
            }
            other => PolicyError::Storage(other),
        }
    }
}

pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errores principales de la aplicación (capa HTTP)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Policy(PolicyError::Storage(e)) => {
                tracing::error!("Storage failure: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Service Unavailable".to_string(),
                        message: "The entity store is not reachable".to_string(),
                        details: Some(json!({ "store_error": e.to_string() })),
                        code: "STORAGE_UNAVAILABLE".to_string(),
                    },
                )
            }

            AppError::Policy(e) => {
                tracing::warn!("Command rejected: {}", e);
                let class = e.status_class();
                let error = match class {
                    StatusClass::NotFound => "Not Found",
                    StatusClass::Conflict => "Conflict",
                    StatusClass::Unprocessable => "Unprocessable Entity",
                    StatusClass::Unavailable => "Service Unavailable",
                };
                (
                    class.http_status(),
                    ErrorResponse {
                        error: error.to_string(),
                        message: e.to_string(),
                        details: None,
                        code: e.code(),
                    },
                )
            }

            AppError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: "VALIDATION_ERROR".to_string(),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_error_codes() {
        let id = Uuid::new_v4();
        assert_eq!(PolicyError::not_found(Entity::Trip, id).code(), "TRIP_NOT_FOUND");
        assert_eq!(
            PolicyError::PreconditionFailed { action: "complete", state: TripState::Draft }.code(),
            "TRIP_NOT_DISPATCHED"
        );
        assert_eq!(
            PolicyError::PreconditionFailed { action: "dispatch", state: TripState::Completed }.code(),
            "TRIP_NOT_DRAFT"
        );
        assert_eq!(
            PolicyError::AlreadyTerminal { entity: Entity::MaintenanceOrder, id, state: "done" }.code(),
            "MAINTENANCE_ORDER_ALREADY_DONE"
        );
    }

    #[test]
    fn test_status_classes() {
        let id = Uuid::new_v4();
        assert_eq!(PolicyError::not_found(Entity::Vehicle, id).status_class(), StatusClass::NotFound);
        assert_eq!(
            PolicyError::from(Violation::DriverSuspended).status_class(),
            StatusClass::Unprocessable
        );
        assert_eq!(
            PolicyError::from(StoreError::VersionConflict { entity: Entity::Vehicle, id }).status_class(),
            StatusClass::Conflict
        );
    }

    #[test]
    fn test_version_conflict_maps_to_conflict() {
        let id = Uuid::new_v4();
        let err = PolicyError::from(StoreError::VersionConflict { entity: Entity::Driver, id });
        assert!(matches!(err, PolicyError::Conflict { entity: Entity::Driver, .. }));
        assert_eq!(err.code(), "CONCURRENT_MODIFICATION");
    }
}
