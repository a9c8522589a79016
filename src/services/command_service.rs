//! Comandos tipados del núcleo
//!
//! Un `Command` llega ya deserializado desde el transporte; se valida aquí y
//! solo entonces se entrega al manager correspondiente.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use super::{
    CoreContext, MaintenanceOrderDetails, MaintenanceService, TripDetails, TripService,
};
use crate::dto::maintenance_dto::{CreateMaintenanceRequest, UpdateMaintenanceRequest};
use crate::dto::trip_dto::{CompleteTripRequest, CreateTripRequest};
use crate::utils::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    CreateTrip(CreateTripRequest),
    DispatchTrip { trip_id: Uuid },
    CompleteTrip { trip_id: Uuid, odometer_end: Option<Decimal> },
    CancelTrip { trip_id: Uuid },
    CreateMaintenanceOrder(CreateMaintenanceRequest),
    StartMaintenanceOrder { order_id: Uuid },
    UpdateMaintenanceOrder { order_id: Uuid, changes: UpdateMaintenanceRequest },
    CompleteMaintenanceOrder { order_id: Uuid },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateTrip(_) => "create_trip",
            Command::DispatchTrip { .. } => "dispatch_trip",
            Command::CompleteTrip { .. } => "complete_trip",
            Command::CancelTrip { .. } => "cancel_trip",
            Command::CreateMaintenanceOrder(_) => "create_maintenance_order",
            Command::StartMaintenanceOrder { .. } => "start_maintenance_order",
            Command::UpdateMaintenanceOrder { .. } => "update_maintenance_order",
            Command::CompleteMaintenanceOrder { .. } => "complete_maintenance_order",
        }
    }

    pub fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            Command::CreateTrip(request) => request.validate(),
            Command::CompleteTrip { odometer_end, .. } => CompleteTripRequest {
                odometer_end: *odometer_end,
            }
            .validate(),
            Command::CreateMaintenanceOrder(request) => request.validate(),
            Command::UpdateMaintenanceOrder { changes, .. } => changes.validate(),
            Command::DispatchTrip { .. }
            | Command::CancelTrip { .. }
            | Command::StartMaintenanceOrder { .. }
            | Command::CompleteMaintenanceOrder { .. } => Ok(()),
        }
    }
}

/// Resultado de un comando: la entidad con sus relaciones
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum CommandOutcome {
    Trip(TripDetails),
    MaintenanceOrder(MaintenanceOrderDetails),
}

pub struct CommandService {
    trips: TripService,
    maintenance: MaintenanceService,
}

impl CommandService {
    pub fn new(ctx: CoreContext) -> Self {
        Self {
            trips: TripService::new(ctx.clone()),
            maintenance: MaintenanceService::new(ctx),
        }
    }

    pub async fn execute(&self, command: Command) -> AppResult<CommandOutcome> {
        command.validate()?;
        debug!("▶️ Ejecutando comando {}", command.name());

        let outcome = match command {
            Command::CreateTrip(request) => CommandOutcome::Trip(self.trips.create(request.into()).await?),
            Command::DispatchTrip { trip_id } => CommandOutcome::Trip(self.trips.dispatch(trip_id).await?),
            Command::CompleteTrip { trip_id, odometer_end } => {
                CommandOutcome::Trip(self.trips.complete(trip_id, odometer_end).await?)
            }
            Command::CancelTrip { trip_id } => CommandOutcome::Trip(self.trips.cancel(trip_id).await?),
            Command::CreateMaintenanceOrder(request) => {
                CommandOutcome::MaintenanceOrder(self.maintenance.create(request.into()).await?)
            }
            Command::StartMaintenanceOrder { order_id } => {
                CommandOutcome::MaintenanceOrder(self.maintenance.start(order_id).await?)
            }
            Command::UpdateMaintenanceOrder { order_id, changes } => {
                CommandOutcome::MaintenanceOrder(self.maintenance.update(order_id, changes.into()).await?)
            }
            Command::CompleteMaintenanceOrder { order_id } => {
                CommandOutcome::MaintenanceOrder(self.maintenance.complete(order_id).await?)
            }
        };
        Ok(outcome)
    }
}
