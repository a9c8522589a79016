//! Manager del ciclo de vida de viajes
//!
//! ```text
//! draft --dispatch--> dispatched --complete--> completed
//! draft --cancel----> cancelled
//! dispatched --cancel--> cancelled
//! ```
//!
//! Cada operación es una unidad: bloquear entidades → cargar snapshots →
//! validar → mutar el viaje → efectos del ledger → un único commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::ledger;
use super::locks::EntityKey;
use super::policy;
use super::CoreContext;
use crate::models::{Driver, NewTrip, Trip, TripFilters, TripState, Vehicle};
use crate::repositories::{Changeset, RecordWrite};
use crate::utils::errors::PolicyResult;

/// Viaje con sus relaciones resueltas
#[derive(Debug, Clone, Serialize)]
pub struct TripDetails {
    pub trip: Trip,
    pub vehicle: Vehicle,
    pub driver: Driver,
}

pub struct TripService {
    ctx: CoreContext,
}

/// Copia del viaje con la versión siguiente
fn next_version(trip: &Trip, now: DateTime<Utc>) -> Trip {
    let mut next = trip.clone();
    next.version = trip.version + 1;
    next.updated_at = now;
    next
}

impl TripService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, new: NewTrip) -> PolicyResult<TripDetails> {
        let _guard = self
            .ctx
            .locks
            .acquire([EntityKey::Vehicle(new.vehicle_id), EntityKey::Driver(new.driver_id)])
            .await;

        let vehicle = self.ctx.require_vehicle(new.vehicle_id).await?;
        let driver = self.ctx.require_driver(new.driver_id).await?;
        let now = Utc::now();

        policy::check_create_trip(&vehicle, &driver, new.cargo_weight, now.date_naive())
            .inspect_err(|e| warn!("🚫 Viaje rechazado para vehículo {}: {}", vehicle.id, e))?;

        let trip = Trip::draft(new, now);
        self.ctx
            .store
            .commit(Changeset::new(now).with_trip(RecordWrite::Insert(trip.clone())))
            .await?;

        info!("📝 Viaje {} creado en borrador ({} → {})", trip.reference, trip.origin, trip.destination);
        Ok(TripDetails { trip, vehicle, driver })
    }

    pub async fn dispatch(&self, trip_id: Uuid) -> PolicyResult<TripDetails> {
        let _guard = self.lock_trip(trip_id).await?;
        let (trip, vehicle, driver) = self.snapshots(trip_id).await?;
        let now = Utc::now();

        policy::check_dispatch(&trip, &vehicle, &driver, now.date_naive())
            .inspect_err(|e| warn!("🚫 Despacho rechazado para {}: {}", trip.reference, e))?;

        let mut next = next_version(&trip, now);
        next.state = TripState::Dispatched;
        next.date_start.get_or_insert(now);
        next.odometer_start.get_or_insert(vehicle.odometer);

        self.ctx
            .store
            .commit(
                Changeset::new(now)
                    .with_trip(RecordWrite::Update { expected_version: trip.version, record: next })
                    .with_effects(ledger::on_dispatch(&vehicle, &driver)),
            )
            .await?;

        info!("🚚 Viaje {} despachado (vehículo {} en ruta)", trip.reference, vehicle.license_plate);
        self.details(trip_id).await
    }

    pub async fn complete(&self, trip_id: Uuid, odometer_end: Option<Decimal>) -> PolicyResult<TripDetails> {
        let _guard = self.lock_trip(trip_id).await?;
        let (trip, vehicle, driver) = self.snapshots(trip_id).await?;
        let now = Utc::now();

        policy::check_complete(&trip, &vehicle, odometer_end)
            .inspect_err(|e| warn!("🚫 Cierre rechazado para {}: {}", trip.reference, e))?;

        let mut next = next_version(&trip, now);
        next.state = TripState::Completed;
        next.date_end = Some(now);
        if odometer_end.is_some() {
            next.odometer_end = odometer_end;
        }

        self.ctx
            .store
            .commit(
                Changeset::new(now)
                    .with_trip(RecordWrite::Update { expected_version: trip.version, record: next })
                    .with_effects(ledger::on_complete(&vehicle, &driver, odometer_end)),
            )
            .await?;

        info!("✅ Viaje {} completado", trip.reference);
        self.details(trip_id).await
    }

    pub async fn cancel(&self, trip_id: Uuid) -> PolicyResult<TripDetails> {
        let _guard = self.lock_trip(trip_id).await?;
        let (trip, vehicle, driver) = self.snapshots(trip_id).await?;
        let now = Utc::now();

        policy::check_cancel(&trip)
            .inspect_err(|e| warn!("🚫 Cancelación rechazada para {}: {}", trip.reference, e))?;

        // El estado previo sale del registro persistido, nunca del llamador
        let prior = trip.state;
        let mut next = next_version(&trip, now);
        next.state = TripState::Cancelled;

        self.ctx
            .store
            .commit(
                Changeset::new(now)
                    .with_trip(RecordWrite::Update { expected_version: trip.version, record: next })
                    .with_effects(ledger::on_cancel(prior, &vehicle, &driver)),
            )
            .await?;

        info!("🛑 Viaje {} cancelado (estado previo: {})", trip.reference, prior);
        self.details(trip_id).await
    }

    pub async fn get(&self, trip_id: Uuid) -> PolicyResult<TripDetails> {
        self.details(trip_id).await
    }

    pub async fn list(&self, filters: &TripFilters) -> PolicyResult<Vec<Trip>> {
        Ok(self.ctx.store.list_trips(filters).await?)
    }

    /// Las referencias vehículo/conductor de un viaje son inmutables, así que
    /// se pueden leer antes de bloquear.
    async fn lock_trip(&self, trip_id: Uuid) -> PolicyResult<super::locks::EntityGuard> {
        let trip = self.ctx.require_trip(trip_id).await?;
        Ok(self
            .ctx
            .locks
            .acquire([
                EntityKey::Trip(trip.id),
                EntityKey::Vehicle(trip.vehicle_id),
                EntityKey::Driver(trip.driver_id),
            ])
            .await)
    }

    async fn snapshots(&self, trip_id: Uuid) -> PolicyResult<(Trip, Vehicle, Driver)> {
        let trip = self.ctx.require_trip(trip_id).await?;
        let vehicle = self.ctx.require_vehicle(trip.vehicle_id).await?;
        let driver = self.ctx.require_driver(trip.driver_id).await?;
        Ok((trip, vehicle, driver))
    }

    async fn details(&self, trip_id: Uuid) -> PolicyResult<TripDetails> {
        let (trip, vehicle, driver) = self.snapshots(trip_id).await?;
        Ok(TripDetails { trip, vehicle, driver })
    }
}
