//! Registro de la flota
//!
//! Alta y edición de vehículos y conductores. Los cambios administrativos de
//! estado (retirar, suspender, reactivar) pasan por el ledger como cualquier
//! otra escritura de estado.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::ledger;
use super::locks::EntityKey;
use super::policy;
use super::CoreContext;
use crate::models::{
    Driver, DriverFilters, DriverPatch, DriverStatus, NewDriver, NewVehicle, Vehicle,
    VehicleFilters, VehiclePatch, VehicleStatus,
};
use crate::repositories::Changeset;
use crate::utils::errors::{Entity, PolicyError, PolicyResult, Violation};

pub struct FleetService {
    ctx: CoreContext,
}

impl FleetService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    pub async fn register_vehicle(&self, new: NewVehicle) -> PolicyResult<Vehicle> {
        let vehicle = Vehicle::register(new, Utc::now());
        self.ctx.store.insert_vehicle(&vehicle).await?;
        info!("🚗 Vehículo {} registrado ({})", vehicle.license_plate, vehicle.vehicle_type);
        Ok(vehicle)
    }

    pub async fn register_driver(&self, new: NewDriver) -> PolicyResult<Driver> {
        let driver = Driver::register(new, Utc::now());
        self.ctx.store.insert_driver(&driver).await?;
        info!("🪪 Conductor {} registrado", driver.full_name);
        Ok(driver)
    }

    pub async fn vehicle(&self, id: Uuid) -> PolicyResult<Vehicle> {
        self.ctx.require_vehicle(id).await
    }

    pub async fn driver(&self, id: Uuid) -> PolicyResult<Driver> {
        self.ctx.require_driver(id).await
    }

    pub async fn list_vehicles(&self, filters: &VehicleFilters) -> PolicyResult<Vec<Vehicle>> {
        Ok(self.ctx.store.list_vehicles(filters).await?)
    }

    pub async fn list_drivers(&self, filters: &DriverFilters) -> PolicyResult<Vec<Driver>> {
        Ok(self.ctx.store.list_drivers(filters).await?)
    }

    pub async fn update_vehicle(&self, id: Uuid, patch: VehiclePatch) -> PolicyResult<Vehicle> {
        let _guard = self.ctx.locks.acquire([EntityKey::Vehicle(id)]).await;
        let current = self.ctx.require_vehicle(id).await?;

        let mut next = current.clone();
        patch.apply(&mut next);
        next.updated_at = Utc::now();
        self.ctx.store.update_vehicle_profile(&next, current.version).await?;

        self.ctx.require_vehicle(id).await
    }

    pub async fn update_driver(&self, id: Uuid, patch: DriverPatch) -> PolicyResult<Driver> {
        let _guard = self.ctx.locks.acquire([EntityKey::Driver(id)]).await;
        let current = self.ctx.require_driver(id).await?;

        let mut next = current.clone();
        patch.apply(&mut next);
        next.updated_at = Utc::now();
        self.ctx.store.update_driver_profile(&next, current.version).await?;

        self.ctx.require_driver(id).await
    }

    /// Baja lógica: el vehículo queda `retired` y conserva su historial
    pub async fn retire_vehicle(&self, id: Uuid) -> PolicyResult<Vehicle> {
        self.override_vehicle(id, VehicleStatus::Retired).await
    }

    pub async fn suspend_vehicle(&self, id: Uuid) -> PolicyResult<Vehicle> {
        self.override_vehicle(id, VehicleStatus::Suspended).await
    }

    /// Un vehículo suspendido vuelve al taller si tiene órdenes abiertas
    pub async fn reinstate_vehicle(&self, id: Uuid) -> PolicyResult<Vehicle> {
        let _guard = self.ctx.locks.acquire([EntityKey::Vehicle(id)]).await;
        let vehicle = self.ctx.require_vehicle(id).await?;
        if vehicle.status != VehicleStatus::Suspended {
            return Err(Violation::VehicleUnavailable { status: vehicle.status }.into());
        }

        let open_orders = self.ctx.store.count_open_orders(id, None).await?;
        let target = if open_orders > 0 {
            VehicleStatus::InShop
        } else {
            VehicleStatus::Available
        };
        self.commit_vehicle(&vehicle, target).await
    }

    pub async fn suspend_driver(&self, id: Uuid) -> PolicyResult<Driver> {
        let _guard = self.ctx.locks.acquire([EntityKey::Driver(id)]).await;
        let driver = self.ctx.require_driver(id).await?;
        policy::check_driver_override(&driver)?;
        self.commit_driver(&driver, DriverStatus::Suspended).await
    }

    pub async fn reinstate_driver(&self, id: Uuid) -> PolicyResult<Driver> {
        let _guard = self.ctx.locks.acquire([EntityKey::Driver(id)]).await;
        let driver = self.ctx.require_driver(id).await?;
        if driver.status != DriverStatus::Suspended {
            return Err(Violation::DriverStatusLocked { status: driver.status }.into());
        }
        self.commit_driver(&driver, DriverStatus::OffDuty).await
    }

    async fn override_vehicle(&self, id: Uuid, target: VehicleStatus) -> PolicyResult<Vehicle> {
        let _guard = self.ctx.locks.acquire([EntityKey::Vehicle(id)]).await;
        let vehicle = self.ctx.require_vehicle(id).await?;
        if vehicle.status == VehicleStatus::Retired {
            return Err(PolicyError::AlreadyTerminal {
                entity: Entity::Vehicle,
                id,
                state: VehicleStatus::Retired.as_str(),
            });
        }
        policy::check_vehicle_override(&vehicle)?;
        self.commit_vehicle(&vehicle, target).await
    }

    async fn commit_vehicle(&self, vehicle: &Vehicle, target: VehicleStatus) -> PolicyResult<Vehicle> {
        self.ctx
            .store
            .commit(Changeset::new(Utc::now()).with_effects(ledger::override_vehicle_status(vehicle, target)))
            .await?;
        info!("🛠️ Vehículo {}: {} → {}", vehicle.license_plate, vehicle.status, target);
        self.ctx.require_vehicle(vehicle.id).await
    }

    async fn commit_driver(&self, driver: &Driver, target: DriverStatus) -> PolicyResult<Driver> {
        self.ctx
            .store
            .commit(Changeset::new(Utc::now()).with_effects(ledger::override_driver_status(driver, target)))
            .await?;
        info!("🛠️ Conductor {}: {} → {}", driver.full_name, driver.status, target);
        self.ctx.require_driver(driver.id).await
    }
}
