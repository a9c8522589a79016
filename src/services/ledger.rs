//! Ledger de disponibilidad
//! 
//! Único componente que escribe `Vehicle.status`, `Vehicle.odometer`,
//! `Driver.status` y `Driver.trips_completed`. Los cambios se expresan como
//! valores `VehicleStatusChange` / `DriverStatusChange` cuyos campos son privados
//! a este módulo: el resto del crate solo puede obtenerlos a través de las
//! funciones de aquí y el store solo sabe aplicarlos.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Driver, DriverStatus, TripState, Vehicle, VehicleStatus};

/// Escritura del estado derivado de un vehículo, versionada sobre el snapshot leído
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleStatusChange {
    vehicle_id: Uuid,
    expected_version: i64,
    status: VehicleStatus,
    odometer: Option<Decimal>,
}

impl VehicleStatusChange {
    fn new(vehicle: &Vehicle, status: VehicleStatus) -> Self {
        Self {
            vehicle_id: vehicle.id,
            expected_version: vehicle.version,
            status,
            odometer: None,
        }
    }

    pub fn vehicle_id(&self) -> Uuid {
        self.vehicle_id
    }

    pub fn expected_version(&self) -> i64 {
        self.expected_version
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn odometer(&self) -> Option<Decimal> {
        self.odometer
    }

    /// Aplica el cambio sobre una copia en memoria (usado por `MemoryStore`)
    pub fn apply_to(&self, vehicle: &mut Vehicle, at: DateTime<Utc>) {
        vehicle.status = self.status;
        if let Some(odometer) = self.odometer {
            vehicle.odometer = odometer;
        }
        vehicle.version += 1;
        vehicle.updated_at = at;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverStatusChange {
    driver_id: Uuid,
    expected_version: i64,
    status: DriverStatus,
    completed_trip: bool,
}

impl DriverStatusChange {
    fn new(driver: &Driver, status: DriverStatus) -> Self {
        Self {
            driver_id: driver.id,
            expected_version: driver.version,
            status,
            completed_trip: false,
        }
    }

    pub fn driver_id(&self) -> Uuid {
        self.driver_id
    }

    pub fn expected_version(&self) -> i64 {
        self.expected_version
    }

    pub fn status(&self) -> DriverStatus {
        self.status
    }

    /// Incremento a aplicar sobre `trips_completed` (0 o 1)
    pub fn trips_completed_delta(&self) -> i32 {
        i32::from(self.completed_trip)
    }

    pub fn apply_to(&self, driver: &mut Driver, at: DateTime<Utc>) {
        driver.status = self.status;
        driver.trips_completed += self.trips_completed_delta();
        driver.version += 1;
        driver.updated_at = at;
    }
}

/// Efectos de una transición sobre los recursos. Vacío si no cambia nada.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerEffects {
    pub vehicle: Option<VehicleStatusChange>,
    pub driver: Option<DriverStatusChange>,
}

/// dispatch: vehículo `on_trip`, conductor `on_duty`
pub fn on_dispatch(vehicle: &Vehicle, driver: &Driver) -> LedgerEffects {
    LedgerEffects {
        vehicle: Some(VehicleStatusChange::new(vehicle, VehicleStatus::OnTrip)),
        driver: Some(DriverStatusChange::new(driver, DriverStatus::OnDuty)),
    }
}

/// complete: vehículo `available` (+ odómetro), conductor `off_duty` y +1 viaje
pub fn on_complete(vehicle: &Vehicle, driver: &Driver, odometer_end: Option<Decimal>) -> LedgerEffects {
    let mut vehicle_change = VehicleStatusChange::new(vehicle, VehicleStatus::Available);
    vehicle_change.odometer = odometer_end;

    let mut driver_change = DriverStatusChange::new(driver, DriverStatus::OffDuty);
    driver_change.completed_trip = true;

    LedgerEffects {
        vehicle: Some(vehicle_change),
        driver: Some(driver_change),
    }
}

/// cancel: solo libera recursos si el estado persistido previo era `dispatched`
pub fn on_cancel(prior: TripState, vehicle: &Vehicle, driver: &Driver) -> LedgerEffects {
    if prior != TripState::Dispatched {
        return LedgerEffects::default();
    }
    LedgerEffects {
        vehicle: Some(VehicleStatusChange::new(vehicle, VehicleStatus::Available)),
        driver: Some(DriverStatusChange::new(driver, DriverStatus::OffDuty)),
    }
}

/// Una orden nueva siempre manda el vehículo al taller
pub fn on_maintenance_opened(vehicle: &Vehicle) -> LedgerEffects {
    LedgerEffects {
        vehicle: Some(VehicleStatusChange::new(vehicle, VehicleStatus::InShop)),
        driver: None,
    }
}

/// Smart revert: el vehículo vuelve a `available` solo si no quedan otras
/// órdenes abiertas y sigue en el taller.
///
/// Siempre produce una escritura del vehículo, aunque el estado no cambie: el
/// conteo de órdenes abiertas solo es válido contra la versión leída, y el
/// commit la exige.
pub fn on_maintenance_closed(vehicle: &Vehicle, other_open_orders: i64) -> LedgerEffects {
    let status = if other_open_orders == 0 && vehicle.status == VehicleStatus::InShop {
        VehicleStatus::Available
    } else {
        vehicle.status
    };
    LedgerEffects {
        vehicle: Some(VehicleStatusChange::new(vehicle, status)),
        driver: None,
    }
}

/// Override administrativo (retirar, suspender, reactivar)
pub fn override_vehicle_status(vehicle: &Vehicle, status: VehicleStatus) -> LedgerEffects {
    LedgerEffects {
        vehicle: Some(VehicleStatusChange::new(vehicle, status)),
        driver: None,
    }
}

pub fn override_driver_status(driver: &Driver, status: DriverStatus) -> LedgerEffects {
    LedgerEffects {
        vehicle: None,
        driver: Some(DriverStatusChange::new(driver, status)),
    }
}

/// Corrección producida por la reconciliación; `None` si el estado ya es el derivado
pub fn reconcile_vehicle(vehicle: &Vehicle, derived: VehicleStatus) -> Option<VehicleStatusChange> {
    (vehicle.status != derived).then(|| VehicleStatusChange::new(vehicle, derived))
}

pub fn reconcile_driver(driver: &Driver, derived: DriverStatus) -> Option<DriverStatusChange> {
    (driver.status != derived).then(|| DriverStatusChange::new(driver, derived))
}
