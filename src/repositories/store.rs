//! Contrato del Entity Store
//! 
//! Lecturas por id, listados filtrados y escrituras versionadas. Toda
//! transición del núcleo se persiste con un único `commit` atómico: o se
//! aplican todas sus escrituras o ninguna.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Driver, DriverFilters, MaintenanceFilters, MaintenanceOrder, Trip, TripFilters, Vehicle,
    VehicleFilters,
};
use crate::services::ledger::{DriverStatusChange, LedgerEffects, VehicleStatusChange};
use crate::utils::errors::StoreResult;

/// Escritura de un registro propio de la transición (viaje u orden)
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWrite<T> {
    Insert(T),
    /// `record.version` ya lleva la versión nueva; se exige `expected_version` en el store
    Update { expected_version: i64, record: T },
}

impl<T> RecordWrite<T> {
    pub fn record(&self) -> &T {
        match self {
            RecordWrite::Insert(record) => record,
            RecordWrite::Update { record, .. } => record,
        }
    }
}

/// Todas las escrituras de una transición
#[derive(Debug, Clone)]
pub struct Changeset {
    pub at: DateTime<Utc>,
    pub trip: Option<RecordWrite<Trip>>,
    pub order: Option<RecordWrite<MaintenanceOrder>>,
    pub vehicle: Option<VehicleStatusChange>,
    pub driver: Option<DriverStatusChange>,
}

impl Changeset {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at,
            trip: None,
            order: None,
            vehicle: None,
            driver: None,
        }
    }

    pub fn with_trip(mut self, write: RecordWrite<Trip>) -> Self {
        self.trip = Some(write);
        self
    }

    pub fn with_order(mut self, write: RecordWrite<MaintenanceOrder>) -> Self {
        self.order = Some(write);
        self
    }

    pub fn with_effects(mut self, effects: LedgerEffects) -> Self {
        self.vehicle = effects.vehicle;
        self.driver = effects.driver;
        self
    }
}

/// Entity Store con lecturas consistentes con las propias escrituras
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>>;
    async fn driver(&self, id: Uuid) -> StoreResult<Option<Driver>>;
    async fn trip(&self, id: Uuid) -> StoreResult<Option<Trip>>;
    async fn maintenance_order(&self, id: Uuid) -> StoreResult<Option<MaintenanceOrder>>;

    async fn list_vehicles(&self, filters: &VehicleFilters) -> StoreResult<Vec<Vehicle>>;
    async fn list_drivers(&self, filters: &DriverFilters) -> StoreResult<Vec<Driver>>;
    async fn list_trips(&self, filters: &TripFilters) -> StoreResult<Vec<Trip>>;
    async fn list_maintenance_orders(&self, filters: &MaintenanceFilters) -> StoreResult<Vec<MaintenanceOrder>>;

    /// Órdenes no terminadas del vehículo, sin contar `excluding`
    async fn count_open_orders(&self, vehicle_id: Uuid, excluding: Option<Uuid>) -> StoreResult<i64>;

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()>;
    async fn insert_driver(&self, driver: &Driver) -> StoreResult<()>;

    /// Escribe los campos de perfil (nunca `status`) si la versión coincide
    async fn update_vehicle_profile(&self, vehicle: &Vehicle, expected_version: i64) -> StoreResult<()>;
    async fn update_driver_profile(&self, driver: &Driver, expected_version: i64) -> StoreResult<()>;

    /// Aplica el changeset de forma atómica
    async fn commit(&self, changes: Changeset) -> StoreResult<()>;
}
