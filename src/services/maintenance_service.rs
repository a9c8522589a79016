//! Manager de órdenes de mantenimiento
//!
//! `scheduled → in_progress → done`. Abrir una orden manda el vehículo al
//! taller; cerrar la última orden abierta lo devuelve a `available`.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::ledger;
use super::locks::{EntityGuard, EntityKey};
use super::policy;
use super::CoreContext;
use crate::models::{
    MaintenanceFilters, MaintenanceOrder, MaintenancePatch, MaintenanceState, NewMaintenanceOrder,
    Vehicle, VehicleStatus,
};
use crate::repositories::{Changeset, RecordWrite};
use crate::utils::errors::PolicyResult;

/// Orden con su vehículo resuelto
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceOrderDetails {
    pub order: MaintenanceOrder,
    pub vehicle: Vehicle,
}

pub struct MaintenanceService {
    ctx: CoreContext,
}

impl MaintenanceService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Abre una orden contra cualquier vehículo existente, sin importar su estado
    pub async fn create(&self, new: NewMaintenanceOrder) -> PolicyResult<MaintenanceOrderDetails> {
        let _guard = self.ctx.locks.acquire([EntityKey::Vehicle(new.vehicle_id)]).await;
        let vehicle = self.ctx.require_vehicle(new.vehicle_id).await?;
        let now = Utc::now();

        if vehicle.status == VehicleStatus::OnTrip {
            // TODO: decidir si abrir una orden sobre un vehículo en ruta debe rechazarse
            warn!(
                "⚠️ Orden de mantenimiento abierta sobre el vehículo {} en ruta; pasa a in_shop",
                vehicle.license_plate
            );
        } else if vehicle.status.is_administrative() {
            // TODO: decidir si un vehículo retirado o suspendido debe conservar su estado;
            // al cerrar la última orden vuelve a `available`
            warn!(
                "⚠️ Orden de mantenimiento abierta sobre el vehículo {} en estado {}; pasa a in_shop",
                vehicle.license_plate, vehicle.status
            );
        }

        let order = MaintenanceOrder::schedule(new, now);
        self.ctx
            .store
            .commit(
                Changeset::new(now)
                    .with_order(RecordWrite::Insert(order.clone()))
                    .with_effects(ledger::on_maintenance_opened(&vehicle)),
            )
            .await?;

        info!("🔧 Orden {} abierta para vehículo {}", order.id, vehicle.license_plate);
        self.details(order.id).await
    }

    pub async fn start(&self, order_id: Uuid) -> PolicyResult<MaintenanceOrderDetails> {
        let _guard = self.lock_order(order_id).await?;
        let order = self.ctx.require_order(order_id).await?;
        let now = Utc::now();

        policy::check_start_order(&order)
            .inspect_err(|e| warn!("🚫 Inicio rechazado para orden {}: {}", order.id, e))?;

        let mut next = order.clone();
        next.state = MaintenanceState::InProgress;
        next.version = order.version + 1;
        next.updated_at = now;

        self.ctx
            .store
            .commit(
                Changeset::new(now)
                    .with_order(RecordWrite::Update { expected_version: order.version, record: next }),
            )
            .await?;

        info!("🔧 Orden {} en curso", order.id);
        self.details(order_id).await
    }

    /// Edición de campos sin efectos sobre el vehículo
    pub async fn update(&self, order_id: Uuid, patch: MaintenancePatch) -> PolicyResult<MaintenanceOrderDetails> {
        let _guard = self.lock_order(order_id).await?;
        let order = self.ctx.require_order(order_id).await?;
        let now = Utc::now();

        policy::check_update_order(&order)?;

        let mut next = order.clone();
        patch.apply(&mut next);
        next.version = order.version + 1;
        next.updated_at = now;

        self.ctx
            .store
            .commit(
                Changeset::new(now)
                    .with_order(RecordWrite::Update { expected_version: order.version, record: next }),
            )
            .await?;

        self.details(order_id).await
    }

    pub async fn complete(&self, order_id: Uuid) -> PolicyResult<MaintenanceOrderDetails> {
        let _guard = self.lock_order(order_id).await?;
        let order = self.ctx.require_order(order_id).await?;
        let vehicle = self.ctx.require_vehicle(order.vehicle_id).await?;
        let now = Utc::now();

        policy::check_complete_order(&order)
            .inspect_err(|e| warn!("🚫 Cierre rechazado para orden {}: {}", order.id, e))?;

        let mut next = order.clone();
        next.state = MaintenanceState::Done;
        next.version = order.version + 1;
        next.updated_at = now;

        // La orden actual queda excluida. Otro proceso puede cerrar otra orden
        // del mismo vehículo entre el conteo y el commit; la escritura
        // versionada del vehículo hace que uno de los dos falle con conflicto.
        let other_open = self
            .ctx
            .store
            .count_open_orders(order.vehicle_id, Some(order.id))
            .await?;
        let effects = ledger::on_maintenance_closed(&vehicle, other_open);
        let reverted = effects
            .vehicle
            .as_ref()
            .is_some_and(|change| change.status() != vehicle.status);

        self.ctx
            .store
            .commit(
                Changeset::new(now)
                    .with_order(RecordWrite::Update { expected_version: order.version, record: next })
                    .with_effects(effects),
            )
            .await?;

        if reverted {
            info!("✅ Orden {} cerrada; vehículo {} disponible", order.id, vehicle.license_plate);
        } else {
            info!(
                "✅ Orden {} cerrada; vehículo {} sigue {} ({} órdenes abiertas)",
                order.id, vehicle.license_plate, vehicle.status, other_open
            );
        }
        self.details(order_id).await
    }

    pub async fn get(&self, order_id: Uuid) -> PolicyResult<MaintenanceOrderDetails> {
        self.details(order_id).await
    }

    pub async fn list(&self, filters: &MaintenanceFilters) -> PolicyResult<Vec<MaintenanceOrder>> {
        Ok(self.ctx.store.list_maintenance_orders(filters).await?)
    }

    async fn lock_order(&self, order_id: Uuid) -> PolicyResult<EntityGuard> {
        let order = self.ctx.require_order(order_id).await?;
        Ok(self
            .ctx
            .locks
            .acquire([EntityKey::Order(order.id), EntityKey::Vehicle(order.vehicle_id)])
            .await)
    }

    async fn details(&self, order_id: Uuid) -> PolicyResult<MaintenanceOrderDetails> {
        let order = self.ctx.require_order(order_id).await?;
        let vehicle = self.ctx.require_vehicle(order.vehicle_id).await?;
        Ok(MaintenanceOrderDetails { order, vehicle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Driver, DriverFilters, Trip, TripFilters, VehicleFilters};
    use crate::repositories::EntityStore;
    use crate::services::test_support::seeded_context;
    use crate::utils::errors::{PolicyError, StoreResult};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn new_order(vehicle_id: Uuid, description: &str) -> NewMaintenanceOrder {
        NewMaintenanceOrder {
            vehicle_id,
            description: description.to_string(),
            service_date: None,
            cost: None,
            mechanic: None,
        }
    }

    #[tokio::test]
    async fn test_open_order_sends_vehicle_to_shop() {
        let (ctx, v, _) = seeded_context(1000).await;
        let service = MaintenanceService::new(ctx);

        let details = service.create(new_order(v.id, "Tyres")).await.unwrap();
        assert_eq!(details.order.state, MaintenanceState::Scheduled);
        assert_eq!(details.order.cost, Decimal::ZERO);
        assert_eq!(details.order.service_date, Utc::now().date_naive());
        assert_eq!(details.vehicle.status, VehicleStatus::InShop);
    }

    #[tokio::test]
    async fn test_smart_revert_waits_for_last_open_order() {
        let (ctx, v, _) = seeded_context(1000).await;
        let service = MaintenanceService::new(ctx.clone());

        let first = service.create(new_order(v.id, "Tyres")).await.unwrap().order;
        let second = service.create(new_order(v.id, "Brakes")).await.unwrap().order;

        let after_first = service.complete(first.id).await.unwrap();
        assert_eq!(after_first.order.state, MaintenanceState::Done);
        assert_eq!(after_first.vehicle.status, VehicleStatus::InShop);

        let after_second = service.complete(second.id).await.unwrap();
        assert_eq!(after_second.vehicle.status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_completing_done_order_is_rejected() {
        let (ctx, v, _) = seeded_context(1000).await;
        let service = MaintenanceService::new(ctx.clone());
        let order = service.create(new_order(v.id, "Tyres")).await.unwrap().order;
        service.complete(order.id).await.unwrap();
        let vehicle_before = ctx.store.vehicle(v.id).await.unwrap().unwrap();

        let err = service.complete(order.id).await.unwrap_err();
        assert!(matches!(err, PolicyError::AlreadyTerminal { .. }));
        assert_eq!(err.code(), "MAINTENANCE_ORDER_ALREADY_DONE");
        assert_eq!(ctx.store.vehicle(v.id).await.unwrap().unwrap(), vehicle_before);
    }

    #[tokio::test]
    async fn test_start_then_complete() {
        let (ctx, v, _) = seeded_context(1000).await;
        let service = MaintenanceService::new(ctx);
        let order = service.create(new_order(v.id, "Engine check")).await.unwrap().order;

        let started = service.start(order.id).await.unwrap();
        assert_eq!(started.order.state, MaintenanceState::InProgress);
        assert_eq!(started.vehicle.status, VehicleStatus::InShop);
        assert!(service.start(order.id).await.is_err());

        let done = service.complete(order.id).await.unwrap();
        assert_eq!(done.vehicle.status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_update_patches_fields_only() {
        let (ctx, v, _) = seeded_context(1000).await;
        let service = MaintenanceService::new(ctx);
        let order = service.create(new_order(v.id, "Tyres")).await.unwrap();

        let patched = service
            .update(
                order.order.id,
                MaintenancePatch {
                    description: Some("Tyres and alignment".to_string()),
                    cost: Some(Decimal::from(450)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.order.description, "Tyres and alignment");
        assert_eq!(patched.order.cost, Decimal::from(450));
        assert_eq!(patched.order.state, MaintenanceState::Scheduled);
        assert_eq!(patched.vehicle.version, order.vehicle.version);

        service.complete(order.order.id).await.unwrap();
        assert!(service.update(order.order.id, MaintenancePatch::default()).await.is_err());
    }

    /// Store compartido que cede el control tras contar órdenes, como lo haría
    /// un viaje de ida y vuelta a la base de datos
    struct SlowCountStore(Arc<dyn EntityStore>);

    #[async_trait::async_trait]
    impl EntityStore for SlowCountStore {
        async fn vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
            self.0.vehicle(id).await
        }
        async fn driver(&self, id: Uuid) -> StoreResult<Option<Driver>> {
            self.0.driver(id).await
        }
        async fn trip(&self, id: Uuid) -> StoreResult<Option<Trip>> {
            self.0.trip(id).await
        }
        async fn maintenance_order(&self, id: Uuid) -> StoreResult<Option<MaintenanceOrder>> {
            self.0.maintenance_order(id).await
        }
        async fn list_vehicles(&self, filters: &VehicleFilters) -> StoreResult<Vec<Vehicle>> {
            self.0.list_vehicles(filters).await
        }
        async fn list_drivers(&self, filters: &DriverFilters) -> StoreResult<Vec<Driver>> {
            self.0.list_drivers(filters).await
        }
        async fn list_trips(&self, filters: &TripFilters) -> StoreResult<Vec<Trip>> {
            self.0.list_trips(filters).await
        }
        async fn list_maintenance_orders(&self, filters: &MaintenanceFilters) -> StoreResult<Vec<MaintenanceOrder>> {
            self.0.list_maintenance_orders(filters).await
        }
        async fn count_open_orders(&self, vehicle_id: Uuid, excluding: Option<Uuid>) -> StoreResult<i64> {
            let count = self.0.count_open_orders(vehicle_id, excluding).await;
            tokio::task::yield_now().await;
            count
        }
        async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
            self.0.insert_vehicle(vehicle).await
        }
        async fn insert_driver(&self, driver: &Driver) -> StoreResult<()> {
            self.0.insert_driver(driver).await
        }
        async fn update_vehicle_profile(&self, vehicle: &Vehicle, expected_version: i64) -> StoreResult<()> {
            self.0.update_vehicle_profile(vehicle, expected_version).await
        }
        async fn update_driver_profile(&self, driver: &Driver, expected_version: i64) -> StoreResult<()> {
            self.0.update_driver_profile(driver, expected_version).await
        }
        async fn commit(&self, changes: Changeset) -> StoreResult<()> {
            self.0.commit(changes).await
        }
    }

    #[tokio::test]
    async fn test_closing_last_orders_from_two_processes() {
        let (ctx, v, _) = seeded_context(1000).await;
        let setup = MaintenanceService::new(ctx.clone());
        let first = setup.create(new_order(v.id, "Tyres")).await.unwrap().order;
        let second = setup.create(new_order(v.id, "Brakes")).await.unwrap().order;

        // Cada proceso tiene su propio registro de bloqueos
        let process_a = MaintenanceService::new(CoreContext::new(Arc::new(SlowCountStore(ctx.store.clone()))));
        let process_b = MaintenanceService::new(CoreContext::new(Arc::new(SlowCountStore(ctx.store.clone()))));

        let (r1, r2) = tokio::join!(process_a.complete(first.id), process_b.complete(second.id));
        let lost: Vec<Uuid> = [(first.id, &r1), (second.id, &r2)]
            .into_iter()
            .filter(|(_, result)| matches!(result, Err(PolicyError::Conflict { .. })))
            .map(|(id, _)| id)
            .collect();
        assert_eq!(lost.len(), 1);

        let retried = process_a.complete(lost[0]).await.unwrap();
        assert_eq!(retried.order.state, MaintenanceState::Done);
        assert_eq!(retried.vehicle.status, VehicleStatus::Available);
        assert_eq!(ctx.store.count_open_orders(v.id, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_order_on_suspended_vehicle_sends_it_to_shop() {
        let (ctx, v, _) = seeded_context(1000).await;
        crate::services::FleetService::new(ctx.clone())
            .suspend_vehicle(v.id)
            .await
            .unwrap();

        let details = MaintenanceService::new(ctx)
            .create(new_order(v.id, "Inspection"))
            .await
            .unwrap();
        assert_eq!(details.vehicle.status, VehicleStatus::InShop);
    }

    #[tokio::test]
    async fn test_order_for_unknown_vehicle() {
        let (ctx, _, _) = seeded_context(1000).await;
        let err = MaintenanceService::new(ctx)
            .create(new_order(Uuid::new_v4(), "Tyres"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VEHICLE_NOT_FOUND");
    }
}
