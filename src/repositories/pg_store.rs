//! Store PostgreSQL
//! 
//! Implementación sqlx del Entity Store. Cada `commit` corre en una sola
//! transacción y cada UPDATE lleva `AND version = $n`: si alguna fila no
//! coincide se devuelve `VersionConflict` y la transacción se descarta.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::store::{Changeset, EntityStore, RecordWrite};
use crate::models::{
    Driver, DriverFilters, MaintenanceFilters, MaintenanceOrder, Trip, TripFilters, Vehicle,
    VehicleFilters,
};
use crate::utils::errors::{Entity, StoreError, StoreResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Traduce violaciones de unicidad a `Duplicate`
fn map_insert_error(err: sqlx::Error, field: &'static str, value: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate {
            field,
            value: value.to_string(),
        },
        _ => StoreError::Database(err),
    }
}

fn expect_one_row(rows: u64, entity: Entity, id: Uuid) -> StoreResult<()> {
    if rows == 1 {
        Ok(())
    } else {
        Err(StoreError::VersionConflict { entity, id })
    }
}

async fn write_trip(tx: &mut Transaction<'_, Postgres>, write: &RecordWrite<Trip>) -> StoreResult<()> {
    match write {
        RecordWrite::Insert(trip) => {
            sqlx::query(
                r#"
                INSERT INTO trips (id, reference, vehicle_id, driver_id, origin, destination, cargo_weight,
                                   state, date_start, date_end, odometer_start, odometer_end, version,
                                   created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(trip.id)
            .bind(&trip.reference)
            .bind(trip.vehicle_id)
            .bind(trip.driver_id)
            .bind(&trip.origin)
            .bind(&trip.destination)
            .bind(trip.cargo_weight)
            .bind(trip.state)
            .bind(trip.date_start)
            .bind(trip.date_end)
            .bind(trip.odometer_start)
            .bind(trip.odometer_end)
            .bind(trip.version)
            .bind(trip.created_at)
            .bind(trip.updated_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_insert_error(e, "reference", &trip.reference))?;
            Ok(())
        }
        RecordWrite::Update { expected_version, record: trip } => {
            let result = sqlx::query(
                r#"
                UPDATE trips
                SET state = $2, date_start = $3, date_end = $4, odometer_start = $5, odometer_end = $6,
                    version = $7, updated_at = $8
                WHERE id = $1 AND version = $9
                "#,
            )
            .bind(trip.id)
            .bind(trip.state)
            .bind(trip.date_start)
            .bind(trip.date_end)
            .bind(trip.odometer_start)
            .bind(trip.odometer_end)
            .bind(trip.version)
            .bind(trip.updated_at)
            .bind(*expected_version)
            .execute(&mut **tx)
            .await?;
            expect_one_row(result.rows_affected(), Entity::Trip, trip.id)
        }
    }
}

async fn write_order(
    tx: &mut Transaction<'_, Postgres>,
    write: &RecordWrite<MaintenanceOrder>,
) -> StoreResult<()> {
    match write {
        RecordWrite::Insert(order) => {
            sqlx::query(
                r#"
                INSERT INTO maintenance_orders (id, vehicle_id, description, cost, mechanic, state,
                                                service_date, version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(order.id)
            .bind(order.vehicle_id)
            .bind(&order.description)
            .bind(order.cost)
            .bind(&order.mechanic)
            .bind(order.state)
            .bind(order.service_date)
            .bind(order.version)
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&mut **tx)
            .await?;
            Ok(())
        }
        RecordWrite::Update { expected_version, record: order } => {
            let result = sqlx::query(
                r#"
                UPDATE maintenance_orders
                SET description = $2, cost = $3, mechanic = $4, state = $5, service_date = $6,
                    version = $7, updated_at = $8
                WHERE id = $1 AND version = $9
                "#,
            )
            .bind(order.id)
            .bind(&order.description)
            .bind(order.cost)
            .bind(&order.mechanic)
            .bind(order.state)
            .bind(order.service_date)
            .bind(order.version)
            .bind(order.updated_at)
            .bind(*expected_version)
            .execute(&mut **tx)
            .await?;
            expect_one_row(result.rows_affected(), Entity::MaintenanceOrder, order.id)
        }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn driver(&self, id: Uuid) -> StoreResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }

    async fn trip(&self, id: Uuid) -> StoreResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(trip)
    }

    async fn maintenance_order(&self, id: Uuid) -> StoreResult<Option<MaintenanceOrder>> {
        let order = sqlx::query_as::<_, MaintenanceOrder>("SELECT * FROM maintenance_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> StoreResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::vehicle_status IS NULL OR status = $1)
              AND ($2::vehicle_type IS NULL OR vehicle_type = $2)
              AND ($3::text IS NULL OR region = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.vehicle_type)
        .bind(&filters.region)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    async fn list_drivers(&self, filters: &DriverFilters) -> StoreResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT * FROM drivers
            WHERE ($1::driver_status IS NULL OR status = $1)
              AND ($2::vehicle_type IS NULL OR license_category = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.license_category)
        .fetch_all(&self.pool)
        .await?;
        Ok(drivers)
    }

    async fn list_trips(&self, filters: &TripFilters) -> StoreResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE ($1::trip_state IS NULL OR state = $1)
              AND ($2::uuid IS NULL OR vehicle_id = $2)
              AND ($3::uuid IS NULL OR driver_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.state)
        .bind(filters.vehicle_id)
        .bind(filters.driver_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }

    async fn list_maintenance_orders(&self, filters: &MaintenanceFilters) -> StoreResult<Vec<MaintenanceOrder>> {
        let orders = sqlx::query_as::<_, MaintenanceOrder>(
            r#"
            SELECT * FROM maintenance_orders
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND ($2::maintenance_state IS NULL OR state = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.vehicle_id)
        .bind(filters.state)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn count_open_orders(&self, vehicle_id: Uuid, excluding: Option<Uuid>) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM maintenance_orders
            WHERE vehicle_id = $1 AND state <> 'done' AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(vehicle_id)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, name, license_plate, vehicle_type, max_capacity, odometer, status,
                                  region, acquisition_cost, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.name)
        .bind(&vehicle.license_plate)
        .bind(vehicle.vehicle_type)
        .bind(vehicle.max_capacity)
        .bind(vehicle.odometer)
        .bind(vehicle.status)
        .bind(&vehicle.region)
        .bind(vehicle.acquisition_cost)
        .bind(vehicle.version)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "license_plate", &vehicle.license_plate))?;
        Ok(())
    }

    async fn insert_driver(&self, driver: &Driver) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO drivers (id, full_name, license_number, license_category, license_expiry,
                                 safety_score, status, trips_completed, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(driver.id)
        .bind(&driver.full_name)
        .bind(&driver.license_number)
        .bind(driver.license_category)
        .bind(driver.license_expiry)
        .bind(driver.safety_score)
        .bind(driver.status)
        .bind(driver.trips_completed)
        .bind(driver.version)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "license_number", &driver.license_number))?;
        Ok(())
    }

    async fn update_vehicle_profile(&self, vehicle: &Vehicle, expected_version: i64) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET name = $2, region = $3, max_capacity = $4, acquisition_cost = $5,
                version = version + 1, updated_at = $6
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.name)
        .bind(&vehicle.region)
        .bind(vehicle.max_capacity)
        .bind(vehicle.acquisition_cost)
        .bind(vehicle.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), Entity::Vehicle, vehicle.id)
    }

    async fn update_driver_profile(&self, driver: &Driver, expected_version: i64) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE drivers
            SET full_name = $2, license_category = $3, license_expiry = $4, safety_score = $5,
                version = version + 1, updated_at = $6
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(driver.id)
        .bind(&driver.full_name)
        .bind(driver.license_category)
        .bind(driver.license_expiry)
        .bind(driver.safety_score)
        .bind(driver.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), Entity::Driver, driver.id)
    }

    async fn commit(&self, changes: Changeset) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(write) = &changes.trip {
            write_trip(&mut tx, write).await?;
        }
        if let Some(write) = &changes.order {
            write_order(&mut tx, write).await?;
        }
        if let Some(change) = &changes.vehicle {
            let result = sqlx::query(
                r#"
                UPDATE vehicles
                SET status = $2, odometer = COALESCE($3, odometer), version = version + 1, updated_at = $4
                WHERE id = $1 AND version = $5
                "#,
            )
            .bind(change.vehicle_id())
            .bind(change.status())
            .bind(change.odometer())
            .bind(changes.at)
            .bind(change.expected_version())
            .execute(&mut *tx)
            .await?;
            expect_one_row(result.rows_affected(), Entity::Vehicle, change.vehicle_id())?;
        }
        if let Some(change) = &changes.driver {
            let result = sqlx::query(
                r#"
                UPDATE drivers
                SET status = $2, trips_completed = trips_completed + $3, version = version + 1, updated_at = $4
                WHERE id = $1 AND version = $5
                "#,
            )
            .bind(change.driver_id())
            .bind(change.status())
            .bind(change.trips_completed_delta())
            .bind(changes.at)
            .bind(change.expected_version())
            .execute(&mut *tx)
            .await?;
            expect_one_row(result.rows_affected(), Entity::Driver, change.driver_id())?;
        }

        tx.commit().await?;
        Ok(())
    }
}
