//! Reconciliación de estados derivados
//!
//! Recalcula `Vehicle.status` y `Driver.status` a partir de los viajes y
//! órdenes no terminados que los referencian, y corrige las diferencias a
//! través del ledger.

use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::ledger;
use super::locks::EntityKey;
use super::CoreContext;
use crate::models::{
    Driver, DriverFilters, DriverStatus, TripFilters, TripState, Vehicle, VehicleFilters,
    VehicleStatus,
};
use crate::repositories::Changeset;
use crate::utils::errors::{PolicyError, PolicyResult};

/// Una corrección aplicada
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Correction {
    pub entity: &'static str,
    pub id: Uuid,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    pub vehicles_checked: usize,
    pub drivers_checked: usize,
    pub corrections: Vec<Correction>,
    pub skipped: Vec<Uuid>,
}

/// Viaje despachado > orden abierta > estado administrativo > disponible
pub fn derive_vehicle_status(vehicle: &Vehicle, dispatched_trips: usize, open_orders: i64) -> VehicleStatus {
    if vehicle.status == VehicleStatus::Retired {
        VehicleStatus::Retired
    } else if dispatched_trips > 0 {
        VehicleStatus::OnTrip
    } else if open_orders > 0 {
        VehicleStatus::InShop
    } else if vehicle.status == VehicleStatus::Suspended {
        VehicleStatus::Suspended
    } else {
        VehicleStatus::Available
    }
}

pub fn derive_driver_status(driver: &Driver, dispatched_trips: usize) -> DriverStatus {
    if dispatched_trips > 0 {
        DriverStatus::OnDuty
    } else if driver.status == DriverStatus::Suspended {
        DriverStatus::Suspended
    } else {
        DriverStatus::OffDuty
    }
}

pub struct ReconciliationService {
    ctx: CoreContext,
}

impl ReconciliationService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    pub async fn reconcile_vehicle(&self, id: Uuid) -> PolicyResult<Option<Correction>> {
        let _guard = self.ctx.locks.acquire([EntityKey::Vehicle(id)]).await;
        let vehicle = self.ctx.require_vehicle(id).await?;

        let dispatched = self
            .ctx
            .store
            .list_trips(&TripFilters {
                state: Some(TripState::Dispatched),
                vehicle_id: Some(id),
                driver_id: None,
            })
            .await?
            .len();
        let open_orders = self.ctx.store.count_open_orders(id, None).await?;
        let derived = derive_vehicle_status(&vehicle, dispatched, open_orders);

        let Some(change) = ledger::reconcile_vehicle(&vehicle, derived) else {
            return Ok(None);
        };
        self.ctx
            .store
            .commit(Changeset::new(Utc::now()).with_effects(ledger::LedgerEffects {
                vehicle: Some(change),
                driver: None,
            }))
            .await?;

        warn!("🩹 Vehículo {} reconciliado: {} → {}", vehicle.license_plate, vehicle.status, derived);
        Ok(Some(Correction {
            entity: "vehicle",
            id,
            from: vehicle.status.to_string(),
            to: derived.to_string(),
        }))
    }

    pub async fn reconcile_driver(&self, id: Uuid) -> PolicyResult<Option<Correction>> {
        let _guard = self.ctx.locks.acquire([EntityKey::Driver(id)]).await;
        let driver = self.ctx.require_driver(id).await?;

        let dispatched = self
            .ctx
            .store
            .list_trips(&TripFilters {
                state: Some(TripState::Dispatched),
                vehicle_id: None,
                driver_id: Some(id),
            })
            .await?
            .len();
        let derived = derive_driver_status(&driver, dispatched);

        let Some(change) = ledger::reconcile_driver(&driver, derived) else {
            return Ok(None);
        };
        self.ctx
            .store
            .commit(Changeset::new(Utc::now()).with_effects(ledger::LedgerEffects {
                vehicle: None,
                driver: Some(change),
            }))
            .await?;

        warn!("🩹 Conductor {} reconciliado: {} → {}", driver.full_name, driver.status, derived);
        Ok(Some(Correction {
            entity: "driver",
            id,
            from: driver.status.to_string(),
            to: derived.to_string(),
        }))
    }

    /// Recorre toda la flota. Un conflicto con un comando concurrente no
    /// aborta la pasada: la entidad se anota como omitida.
    pub async fn reconcile_all(&self) -> PolicyResult<ReconciliationReport> {
        let mut report = ReconciliationReport::default();

        let vehicles = self.ctx.store.list_vehicles(&VehicleFilters::default()).await?;
        report.vehicles_checked = vehicles.len();
        for vehicle in vehicles {
            match self.reconcile_vehicle(vehicle.id).await {
                Ok(Some(correction)) => report.corrections.push(correction),
                Ok(None) => {}
                Err(PolicyError::Conflict { id, .. }) => report.skipped.push(id),
                Err(e) => return Err(e),
            }
        }

        let drivers = self.ctx.store.list_drivers(&DriverFilters::default()).await?;
        report.drivers_checked = drivers.len();
        for driver in drivers {
            match self.reconcile_driver(driver.id).await {
                Ok(Some(correction)) => report.corrections.push(correction),
                Ok(None) => {}
                Err(PolicyError::Conflict { id, .. }) => report.skipped.push(id),
                Err(e) => return Err(e),
            }
        }

        info!(
            "🩺 Reconciliación: {} vehículos, {} conductores, {} correcciones",
            report.vehicles_checked,
            report.drivers_checked,
            report.corrections.len()
        );
        Ok(report)
    }
}

/// Tarea periódica de reconciliación
pub fn spawn_periodic(ctx: CoreContext, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let service = ReconciliationService::new(ctx);
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = service.reconcile_all().await {
                error!("❌ Error en la reconciliación periódica: {}", e);
            }
        }
    })
}
