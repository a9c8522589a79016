//! Services module
//! 
//! Este módulo contiene la lógica de negocio del núcleo de despacho:
//! política de validación, ledger de disponibilidad, serialización por
//! entidad y los managers de viajes y de mantenimiento.

pub mod policy;
pub mod ledger;
pub mod locks;
pub mod trip_service;
pub mod maintenance_service;
pub mod fleet_service;
pub mod reconciliation_service;
pub mod command_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use trip_service::{TripDetails, TripService};
pub use maintenance_service::{MaintenanceOrderDetails, MaintenanceService};
pub use fleet_service::FleetService;
pub use reconciliation_service::{ReconciliationReport, ReconciliationService};
pub use command_service::{Command, CommandOutcome, CommandService};

use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Driver, MaintenanceOrder, Trip, Vehicle};
use crate::repositories::EntityStore;
use crate::utils::errors::{Entity, PolicyError, PolicyResult};
use locks::LockRegistry;

/// Dependencias compartidas por todos los servicios del núcleo
#[derive(Clone)]
pub struct CoreContext {
    pub store: Arc<dyn EntityStore>,
    pub locks: Arc<LockRegistry>,
}

impl CoreContext {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            locks: Arc::new(LockRegistry::new()),
        }
    }

    pub async fn require_vehicle(&self, id: Uuid) -> PolicyResult<Vehicle> {
        self.store
            .vehicle(id)
            .await?
            .ok_or_else(|| PolicyError::not_found(Entity::Vehicle, id))
    }

    pub async fn require_driver(&self, id: Uuid) -> PolicyResult<Driver> {
        self.store
            .driver(id)
            .await?
            .ok_or_else(|| PolicyError::not_found(Entity::Driver, id))
    }

    pub async fn require_trip(&self, id: Uuid) -> PolicyResult<Trip> {
        self.store
            .trip(id)
            .await?
            .ok_or_else(|| PolicyError::not_found(Entity::Trip, id))
    }

    pub async fn require_order(&self, id: Uuid) -> PolicyResult<MaintenanceOrder> {
        self.store
            .maintenance_order(id)
            .await?
            .ok_or_else(|| PolicyError::not_found(Entity::MaintenanceOrder, id))
    }
}
