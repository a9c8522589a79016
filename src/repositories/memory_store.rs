//! Store en memoria
//! 
//! Tablas en `HashMap` detrás de un único `RwLock`; cada `commit` valida todas
//! las versiones antes de escribir nada.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{Changeset, EntityStore, RecordWrite};
use crate::models::{
    Driver, DriverFilters, MaintenanceFilters, MaintenanceOrder, Trip, TripFilters, Vehicle,
    VehicleFilters,
};
use crate::utils::errors::{Entity, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    drivers: HashMap<Uuid, Driver>,
    trips: HashMap<Uuid, Trip>,
    orders: HashMap<Uuid, MaintenanceOrder>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_version(entity: Entity, id: Uuid, current: Option<i64>, expected: i64) -> StoreResult<()> {
    match current {
        None => Err(StoreError::NotFound { entity, id }),
        Some(version) if version != expected => Err(StoreError::VersionConflict { entity, id }),
        Some(_) => Ok(()),
    }
}

fn check_record<T>(
    entity: Entity,
    write: &RecordWrite<T>,
    id: Uuid,
    current: Option<i64>,
) -> StoreResult<()> {
    match write {
        RecordWrite::Insert(_) if current.is_some() => Err(StoreError::Duplicate {
            field: "id",
            value: id.to_string(),
        }),
        RecordWrite::Insert(_) => Ok(()),
        RecordWrite::Update { expected_version, .. } => {
            check_version(entity, id, current, *expected_version)
        }
    }
}

fn sorted_by_creation<T, F>(mut items: Vec<T>, created: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(created(item)));
    items
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn driver(&self, id: Uuid) -> StoreResult<Option<Driver>> {
        Ok(self.tables.read().await.drivers.get(&id).cloned())
    }

    async fn trip(&self, id: Uuid) -> StoreResult<Option<Trip>> {
        Ok(self.tables.read().await.trips.get(&id).cloned())
    }

    async fn maintenance_order(&self, id: Uuid) -> StoreResult<Option<MaintenanceOrder>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> StoreResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        let items = tables.vehicles.values().filter(|v| filters.matches(v)).cloned().collect();
        Ok(sorted_by_creation(items, |v: &Vehicle| v.created_at))
    }

    async fn list_drivers(&self, filters: &DriverFilters) -> StoreResult<Vec<Driver>> {
        let tables = self.tables.read().await;
        let items = tables.drivers.values().filter(|d| filters.matches(d)).cloned().collect();
        Ok(sorted_by_creation(items, |d: &Driver| d.created_at))
    }

    async fn list_trips(&self, filters: &TripFilters) -> StoreResult<Vec<Trip>> {
        let tables = self.tables.read().await;
        let items = tables.trips.values().filter(|t| filters.matches(t)).cloned().collect();
        Ok(sorted_by_creation(items, |t: &Trip| t.created_at))
    }

    async fn list_maintenance_orders(&self, filters: &MaintenanceFilters) -> StoreResult<Vec<MaintenanceOrder>> {
        let tables = self.tables.read().await;
        let items = tables.orders.values().filter(|o| filters.matches(o)).cloned().collect();
        Ok(sorted_by_creation(items, |o: &MaintenanceOrder| o.created_at))
    }

    async fn count_open_orders(&self, vehicle_id: Uuid, excluding: Option<Uuid>) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .orders
            .values()
            .filter(|o| o.vehicle_id == vehicle_id && o.state.is_open() && Some(o.id) != excluding)
            .count();
        Ok(count as i64)
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.vehicles.values().any(|v| v.license_plate == vehicle.license_plate) {
            return Err(StoreError::Duplicate {
                field: "license_plate",
                value: vehicle.license_plate.clone(),
            });
        }
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn insert_driver(&self, driver: &Driver) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.drivers.values().any(|d| d.license_number == driver.license_number) {
            return Err(StoreError::Duplicate {
                field: "license_number",
                value: driver.license_number.clone(),
            });
        }
        tables.drivers.insert(driver.id, driver.clone());
        Ok(())
    }

    async fn update_vehicle_profile(&self, vehicle: &Vehicle, expected_version: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let current = tables
            .vehicles
            .get_mut(&vehicle.id)
            .ok_or(StoreError::NotFound { entity: Entity::Vehicle, id: vehicle.id })?;
        check_version(Entity::Vehicle, vehicle.id, Some(current.version), expected_version)?;

        current.name = vehicle.name.clone();
        current.region = vehicle.region.clone();
        current.max_capacity = vehicle.max_capacity;
        current.acquisition_cost = vehicle.acquisition_cost;
        current.version = expected_version + 1;
        current.updated_at = vehicle.updated_at;
        Ok(())
    }

    async fn update_driver_profile(&self, driver: &Driver, expected_version: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let current = tables
            .drivers
            .get_mut(&driver.id)
            .ok_or(StoreError::NotFound { entity: Entity::Driver, id: driver.id })?;
        check_version(Entity::Driver, driver.id, Some(current.version), expected_version)?;

        current.full_name = driver.full_name.clone();
        current.license_category = driver.license_category;
        current.license_expiry = driver.license_expiry;
        current.safety_score = driver.safety_score;
        current.version = expected_version + 1;
        current.updated_at = driver.updated_at;
        Ok(())
    }

    async fn commit(&self, changes: Changeset) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        // Validar todo antes de escribir nada
        if let Some(write) = &changes.trip {
            let id = write.record().id;
            let current = tables.trips.get(&id).map(|t| t.version);
            check_record(Entity::Trip, write, id, current)?;
        }
        if let Some(write) = &changes.order {
            let id = write.record().id;
            let current = tables.orders.get(&id).map(|o| o.version);
            check_record(Entity::MaintenanceOrder, write, id, current)?;
        }
        if let Some(change) = &changes.vehicle {
            let id = change.vehicle_id();
            let current = tables.vehicles.get(&id).map(|v| v.version);
            check_version(Entity::Vehicle, id, current, change.expected_version())?;
        }
        if let Some(change) = &changes.driver {
            let id = change.driver_id();
            let current = tables.drivers.get(&id).map(|d| d.version);
            check_version(Entity::Driver, id, current, change.expected_version())?;
        }

        if let Some(write) = changes.trip {
            let trip = match write {
                RecordWrite::Insert(trip) | RecordWrite::Update { record: trip, .. } => trip,
            };
            tables.trips.insert(trip.id, trip);
        }
        if let Some(write) = changes.order {
            let order = match write {
                RecordWrite::Insert(order) | RecordWrite::Update { record: order, .. } => order,
            };
            tables.orders.insert(order.id, order);
        }
        if let Some(change) = changes.vehicle {
            if let Some(vehicle) = tables.vehicles.get_mut(&change.vehicle_id()) {
                change.apply_to(vehicle, changes.at);
            }
        }
        if let Some(change) = changes.driver {
            if let Some(driver) = tables.drivers.get_mut(&change.driver_id()) {
                change.apply_to(driver, changes.at);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DriverStatus, TripState, VehicleStatus};
    use crate::services::ledger;
    use crate::services::test_support::{driver, trip_for, vehicle};
    use chrono::Utc;

    #[tokio::test]
    async fn test_commit_applies_all_writes() {
        let store = MemoryStore::new();
        let v = vehicle(1000);
        let d = driver();
        store.insert_vehicle(&v).await.unwrap();
        store.insert_driver(&d).await.unwrap();

        let trip = trip_for(&v, &d, 200);
        let mut dispatched = trip.clone();
        dispatched.state = TripState::Dispatched;
        dispatched.version = 2;

        store
            .commit(Changeset::new(Utc::now()).with_trip(RecordWrite::Insert(trip.clone())))
            .await
            .unwrap();
        store
            .commit(
                Changeset::new(Utc::now())
                    .with_trip(RecordWrite::Update { expected_version: 1, record: dispatched })
                    .with_effects(ledger::on_dispatch(&v, &d)),
            )
            .await
            .unwrap();

        assert_eq!(store.trip(trip.id).await.unwrap().unwrap().state, TripState::Dispatched);
        let stored_vehicle = store.vehicle(v.id).await.unwrap().unwrap();
        assert_eq!(stored_vehicle.status, VehicleStatus::OnTrip);
        assert_eq!(stored_vehicle.version, 2);
        assert_eq!(store.driver(d.id).await.unwrap().unwrap().status, DriverStatus::OnDuty);
    }

    #[tokio::test]
    async fn test_stale_resource_version_aborts_whole_changeset() {
        let store = MemoryStore::new();
        let v = vehicle(1000);
        let d = driver();
        store.insert_vehicle(&v).await.unwrap();
        store.insert_driver(&d).await.unwrap();
        let trip = trip_for(&v, &d, 200);
        store
            .commit(Changeset::new(Utc::now()).with_trip(RecordWrite::Insert(trip.clone())))
            .await
            .unwrap();

        // Otro comando movió el vehículo después de que leyéramos `v`
        store
            .commit(Changeset::new(Utc::now()).with_effects(ledger::on_maintenance_opened(&v)))
            .await
            .unwrap();

        let mut dispatched = trip.clone();
        dispatched.state = TripState::Dispatched;
        dispatched.version = 2;
        let err = store
            .commit(
                Changeset::new(Utc::now())
                    .with_trip(RecordWrite::Update { expected_version: 1, record: dispatched })
                    .with_effects(ledger::on_dispatch(&v, &d)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::VersionConflict { entity: Entity::Vehicle, .. }));
        assert_eq!(store.trip(trip.id).await.unwrap().unwrap().state, TripState::Draft);
        assert_eq!(store.driver(d.id).await.unwrap().unwrap().status, DriverStatus::OffDuty);
        assert_eq!(store.vehicle(v.id).await.unwrap().unwrap().status, VehicleStatus::InShop);
    }

    #[tokio::test]
    async fn test_duplicate_license_number_rejected() {
        let store = MemoryStore::new();
        let first = driver();
        let mut second = driver();
        second.license_number = first.license_number.clone();

        store.insert_driver(&first).await.unwrap();
        let err = store.insert_driver(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "license_number", .. }));
    }

    #[tokio::test]
    async fn test_count_open_orders_excludes_self_and_done() {
        let store = MemoryStore::new();
        let v = vehicle(1000);
        store.insert_vehicle(&v).await.unwrap();

        let first = crate::services::test_support::order_for(&v);
        let mut second = crate::services::test_support::order_for(&v);
        second.state = crate::models::MaintenanceState::Done;
        for order in [first.clone(), second] {
            store
                .commit(Changeset::new(Utc::now()).with_order(RecordWrite::Insert(order)))
                .await
                .unwrap();
        }

        assert_eq!(store.count_open_orders(v.id, None).await.unwrap(), 1);
        assert_eq!(store.count_open_orders(v.id, Some(first.id)).await.unwrap(), 0);
    }
}
