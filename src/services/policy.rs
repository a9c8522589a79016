//! Política de validación
//! 
//! Predicados puros evaluados contra snapshots ya cargados (y ya bloqueados por
//! el llamador). No leen ni escriben el store.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    Driver, DriverStatus, MaintenanceOrder, MaintenanceState, Trip, TripState, Vehicle,
    VehicleStatus,
};
use crate::utils::errors::{Entity, PolicyError, PolicyResult, Violation};

/// Comprobaciones de asignación vehículo/conductor, en orden fijo:
/// disponibilidad, capacidad, suspensión, servicio, vencimiento, categoría.
/// Devuelve la primera que falla.
pub fn check_assignment(
    vehicle: &Vehicle,
    driver: &Driver,
    cargo_weight: Decimal,
    today: NaiveDate,
) -> Result<(), Violation> {
    if vehicle.status != VehicleStatus::Available {
        return Err(Violation::VehicleUnavailable { status: vehicle.status });
    }
    if cargo_weight > vehicle.max_capacity {
        return Err(Violation::CapacityExceeded {
            cargo_weight,
            max_capacity: vehicle.max_capacity,
        });
    }
    if driver.status == DriverStatus::Suspended {
        return Err(Violation::DriverSuspended);
    }
    if driver.status == DriverStatus::OnDuty {
        return Err(Violation::DriverOnDuty);
    }
    if !driver.license_valid_on(today) {
        return Err(Violation::LicenseExpired { expiry: driver.license_expiry });
    }
    if driver.license_category != vehicle.vehicle_type {
        return Err(Violation::LicenseCategoryMismatch {
            license: driver.license_category,
            vehicle: vehicle.vehicle_type,
        });
    }
    Ok(())
}

pub fn check_create_trip(
    vehicle: &Vehicle,
    driver: &Driver,
    cargo_weight: Decimal,
    today: NaiveDate,
) -> PolicyResult<()> {
    check_assignment(vehicle, driver, cargo_weight, today).map_err(PolicyError::from)
}

/// Un borrador no reserva recursos, así que al despachar se repiten las
/// comprobaciones de asignación contra el estado actual.
pub fn check_dispatch(
    trip: &Trip,
    vehicle: &Vehicle,
    driver: &Driver,
    today: NaiveDate,
) -> PolicyResult<()> {
    if trip.state != TripState::Draft {
        return Err(PolicyError::PreconditionFailed { action: "dispatch", state: trip.state });
    }
    check_assignment(vehicle, driver, trip.cargo_weight, today).map_err(PolicyError::from)
}

pub fn check_complete(
    trip: &Trip,
    vehicle: &Vehicle,
    odometer_end: Option<Decimal>,
) -> PolicyResult<()> {
    if trip.state != TripState::Dispatched {
        return Err(PolicyError::PreconditionFailed { action: "complete", state: trip.state });
    }
    if let Some(reading) = odometer_end {
        let minimum = trip
            .odometer_start
            .map_or(vehicle.odometer, |start| start.max(vehicle.odometer));
        if reading < minimum {
            return Err(Violation::InvalidOdometer { reading, minimum }.into());
        }
    }
    Ok(())
}

pub fn check_cancel(trip: &Trip) -> PolicyResult<()> {
    if trip.state.is_terminal() {
        return Err(PolicyError::PreconditionFailed { action: "cancel", state: trip.state });
    }
    Ok(())
}

pub fn check_complete_order(order: &MaintenanceOrder) -> PolicyResult<()> {
    if order.state == MaintenanceState::Done {
        return Err(PolicyError::AlreadyTerminal {
            entity: Entity::MaintenanceOrder,
            id: order.id,
            state: MaintenanceState::Done.as_str(),
        });
    }
    Ok(())
}

pub fn check_start_order(order: &MaintenanceOrder) -> PolicyResult<()> {
    match order.state {
        MaintenanceState::Scheduled => Ok(()),
        MaintenanceState::Done => check_complete_order(order),
        state => Err(PolicyError::OrderPreconditionFailed { action: "start", state: state.as_str() }),
    }
}

/// Solo se editan órdenes abiertas
pub fn check_update_order(order: &MaintenanceOrder) -> PolicyResult<()> {
    check_complete_order(order)
}

/// Un vehículo en ruta no se puede retirar ni suspender
pub fn check_vehicle_override(vehicle: &Vehicle) -> PolicyResult<()> {
    if vehicle.status == VehicleStatus::OnTrip {
        return Err(Violation::VehicleOnTrip.into());
    }
    Ok(())
}

/// El estado `on_duty` pertenece a los viajes; el administrador no lo toca
pub fn check_driver_override(driver: &Driver) -> PolicyResult<()> {
    if driver.status == DriverStatus::OnDuty {
        return Err(Violation::DriverStatusLocked { status: driver.status }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VehicleType;
    use crate::services::test_support::{driver, trip_for, vehicle};
    use chrono::{Duration, Utc};

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[test]
    fn test_valid_assignment_passes() {
        assert!(check_assignment(&vehicle(1000), &driver(), Decimal::from(800), today()).is_ok());
        assert!(check_assignment(&vehicle(1000), &driver(), Decimal::from(1000), today()).is_ok());
    }

    #[test]
    fn test_capacity_exceeded() {
        let err = check_assignment(&vehicle(1000), &driver(), Decimal::from(1001), today())
            .unwrap_err();
        assert_eq!(err.code(), "CAPACITY_EXCEEDED");
    }

    #[test]
    fn test_first_failing_check_wins() {
        // Todo falla a la vez: gana la disponibilidad
        let mut v = vehicle(100);
        v.status = VehicleStatus::InShop;
        let mut d = driver();
        d.status = DriverStatus::Suspended;
        d.license_expiry = today() - Duration::days(1);
        d.license_category = VehicleType::Bike;

        let err = check_assignment(&v, &d, Decimal::from(500), today()).unwrap_err();
        assert_eq!(err.code(), "VEHICLE_UNAVAILABLE");

        v.status = VehicleStatus::Available;
        let err = check_assignment(&v, &d, Decimal::from(500), today()).unwrap_err();
        assert_eq!(err.code(), "CAPACITY_EXCEEDED");

        let err = check_assignment(&v, &d, Decimal::from(50), today()).unwrap_err();
        assert_eq!(err.code(), "DRIVER_SUSPENDED");

        d.status = DriverStatus::OnDuty;
        let err = check_assignment(&v, &d, Decimal::from(50), today()).unwrap_err();
        assert_eq!(err.code(), "DRIVER_ON_DUTY");

        d.status = DriverStatus::OffDuty;
        let err = check_assignment(&v, &d, Decimal::from(50), today()).unwrap_err();
        assert_eq!(err.code(), "LICENSE_EXPIRED");

        d.license_expiry = today();
        let err = check_assignment(&v, &d, Decimal::from(50), today()).unwrap_err();
        assert_eq!(err.code(), "LICENSE_CATEGORY_MISMATCH");
    }

    #[test]
    fn test_license_valid_through_expiry_day() {
        let mut d = driver();
        d.license_expiry = today();
        assert!(check_assignment(&vehicle(1000), &d, Decimal::ONE, today()).is_ok());
    }

    #[test]
    fn test_trip_state_graph() {
        let v = vehicle(1000);
        let d = driver();
        let mut trip = trip_for(&v, &d, 100);

        assert!(check_dispatch(&trip, &v, &d, today()).is_ok());
        assert!(check_cancel(&trip).is_ok());
        let err = check_complete(&trip, &v, None).unwrap_err();
        assert!(matches!(err, PolicyError::PreconditionFailed { action: "complete", state: TripState::Draft }));

        trip.state = TripState::Dispatched;
        assert!(check_complete(&trip, &v, None).is_ok());
        assert!(check_cancel(&trip).is_ok());
        assert!(check_dispatch(&trip, &v, &d, today()).is_err());

        for terminal in [TripState::Completed, TripState::Cancelled] {
            trip.state = terminal;
            assert!(check_dispatch(&trip, &v, &d, today()).is_err());
            assert!(check_complete(&trip, &v, None).is_err());
            assert!(check_cancel(&trip).is_err());
        }
    }

    #[test]
    fn test_odometer_cannot_go_backwards() {
        let mut v = vehicle(1000);
        v.odometer = Decimal::from(1200);
        let d = driver();
        let mut trip = trip_for(&v, &d, 100);
        trip.state = TripState::Dispatched;

        let err = check_complete(&trip, &v, Some(Decimal::from(1100))).unwrap_err();
        assert_eq!(err.code(), "INVALID_ODOMETER");
        assert!(check_complete(&trip, &v, Some(Decimal::from(1200))).is_ok());
    }

    #[test]
    fn test_done_order_is_terminal() {
        let v = vehicle(1000);
        let mut order = crate::services::test_support::order_for(&v);
        assert!(check_complete_order(&order).is_ok());
        assert!(check_start_order(&order).is_ok());

        order.state = MaintenanceState::InProgress;
        assert!(check_complete_order(&order).is_ok());
        assert!(check_start_order(&order).is_err());

        order.state = MaintenanceState::Done;
        let err = check_complete_order(&order).unwrap_err();
        assert!(matches!(err, PolicyError::AlreadyTerminal { .. }));
        assert!(check_update_order(&order).is_err());
    }
}
